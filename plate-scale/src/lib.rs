// SPDX-License-Identifier: MIT
//! # plate-scale: Bounded Downscaling for Vision-Model Uploads
//!
//! This crate turns an arbitrary photo raster into one whose longest side fits a
//! caller-chosen bound, without ever upscaling and without distorting the aspect
//! ratio. It is the resize half of the food photo preparation pipeline; decoding
//! and JPEG encoding live in the main crate.
//!
//! ## Key Components
//!
//! - [`presets`]: Scaling plan computation (`ratio = min(1, max / longest side)`)
//! - [`cpu`]: Lanczos3 resampling of tightly packed RGB8 buffers via fast_image_resize
//!
//! ## Usage Example
//!
//! ```rust
//! use plate_scale::{cpu::scale_rgb_cpu, presets::{build_plan, Size}};
//!
//! let input = Size { w: 1600, h: 1200 };
//! let plan = build_plan(input, 800);
//! assert_eq!((plan.out.w, plan.out.h), (800, 600));
//!
//! let rgb = vec![0u8; 1600 * 1200 * 3];
//! let mut resizer = fast_image_resize::Resizer::new();
//! let scaled = scale_rgb_cpu(&mut resizer, &rgb, input, &plan).unwrap();
//! assert_eq!(scaled.len(), 800 * 600 * 3);
//! ```

pub mod cpu;
pub mod presets;
