// SPDX-License-Identifier: MIT
//! # Scaling Plan Computation
//!
//! A [`ScalePlan`] records the input size, the bound on the longest side, and the
//! output size that the resampler must produce.
//!
//! The rules:
//! - `ratio = max_long_side / max(w, h)`
//! - `ratio >= 1` means the image already fits and is left alone (no upscaling)
//! - otherwise each side becomes `round(side * ratio)`, clamped to at least 1px

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    /// Length of the longer side.
    pub fn long_side(self) -> u32 {
        self.w.max(self.h)
    }

    /// True when either side is zero.
    pub fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Computed output parameters for a single resize.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalePlan {
    /// Original input dimensions
    pub input: Size,
    /// Bound applied to the longest side
    pub max_long_side: u32,
    /// Scale factor actually applied (1.0 when no resize happens)
    pub ratio: f64,
    /// Final computed output dimensions
    pub out: Size,
}

impl ScalePlan {
    /// True when the plan leaves the image untouched.
    pub fn is_identity(&self) -> bool {
        self.out == self.input
    }
}

/// Compute the plan for clamping `input`'s longest side to `max_long_side`.
///
/// Empty inputs and a zero bound produce an identity plan; callers that care
/// reject those before planning (see [`crate::cpu::scale_rgb_cpu`]).
pub fn build_plan(input: Size, max_long_side: u32) -> ScalePlan {
    let (w, h) = fit_preserve(input, max_long_side);
    let out = Size { w, h };
    let ratio = if out == input {
        1.0
    } else {
        max_long_side as f64 / input.long_side() as f64
    };
    ScalePlan {
        input,
        max_long_side,
        ratio,
        out,
    }
}

/// Fit image within max_long constraint while preserving aspect ratio.
/// Never upscales.
fn fit_preserve(input: Size, max_long: u32) -> (u32, u32) {
    if input.is_empty() || max_long == 0 {
        return (input.w, input.h);
    }
    let long = input.long_side();
    if long <= max_long {
        return (input.w, input.h);
    }
    // Multiply before dividing so exact halves round the same way every time.
    let scale = |side: u32| -> u32 {
        ((side as f64 * max_long as f64 / long as f64).round() as u32).max(1)
    };
    (scale(input.w), scale(input.h))
}
