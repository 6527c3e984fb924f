// SPDX-License-Identifier: MIT
// CPU scaler built on fast_image_resize (SIMD-accelerated).
// RGB8 in → RGB8 out, Lanczos3 convolution.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x3;
use fir::{FilterType, ResizeAlg, ResizeOptions, Resizer};

use crate::presets::{ScalePlan, Size};

#[derive(Debug, thiserror::Error)]
pub enum ScaleError {
    #[error("Input image has zero width or height ({0})")]
    EmptyInput(Size),
    #[error("Maximum dimension must be greater than 0")]
    ZeroBound,
    #[error("Input buffer holds {actual} bytes, expected {expected} for {size} RGB8")]
    BufferMismatch {
        size: Size,
        expected: usize,
        actual: usize,
    },
    #[error("Fast image resize error: {0}")]
    Fir(#[from] fir::ResizeError),
    #[error("Image buffer error: {0}")]
    ImageBuf(#[from] fir::ImageBufferError),
}

/// Bytes needed for a tightly packed RGB8 raster of `size`.
pub fn rgb_len(size: Size) -> usize {
    (size.w as usize) * (size.h as usize) * 3
}

/// Resample a tightly packed RGB8 buffer to `plan.out`.
///
/// Identity plans return a copy of the input untouched so the caller always
/// owns the result.
pub fn scale_rgb_cpu(
    resizer: &mut Resizer,
    src_rgb: &[u8],
    src: Size,
    plan: &ScalePlan,
) -> Result<Vec<u8>, ScaleError> {
    if src.is_empty() {
        return Err(ScaleError::EmptyInput(src));
    }
    if plan.max_long_side == 0 {
        return Err(ScaleError::ZeroBound);
    }
    let expected = rgb_len(src);
    if src_rgb.len() != expected {
        return Err(ScaleError::BufferMismatch {
            size: src,
            expected,
            actual: src_rgb.len(),
        });
    }
    if plan.is_identity() {
        return Ok(src_rgb.to_vec());
    }

    let src_view = TypedImageRef::<U8x3>::from_buffer(src.w, src.h, src_rgb)?;

    let mut dst = vec![0u8; rgb_len(plan.out)];
    let mut dst_image = TypedImage::<U8x3>::from_buffer(plan.out.w, plan.out.h, &mut dst)?;

    let opts = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    resizer.resize_typed::<U8x3>(&src_view, &mut dst_image, &opts)?;

    Ok(dst)
}
