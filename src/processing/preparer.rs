//! # Image Preparation Pipeline
//!
//! Turns an uploaded photo into the inline payload a vision model accepts:
//!
//! 1. **Decode**: bytes → raster (any format the `image` crate understands)
//! 2. **Normalize color**: anything that is not 8-bit RGB becomes RGB8
//! 3. **Resize**: clamp the longest side to `max_dimension` (Lanczos3, never upscale)
//! 4. **Encode**: JPEG at the requested quality with optimized Huffman tables
//! 5. **Base64**: standard alphabet with padding, ready for a `data:` URL
//!
//! Each run is independent; nothing is cached between calls. A decode failure
//! yields [`AnalyzerError::Decode`] and no output. Every later failure is a
//! fatal [`AnalyzerError::Encode`].

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose};
use fast_image_resize::Resizer;
use image::{DynamicImage, GenericImageView, ImageReader, RgbImage};
use jpeg_encoder::{ColorType as JpegColorType, Encoder};
use plate_scale::cpu::scale_rgb_cpu;
use plate_scale::presets::{Size, build_plan};

use crate::config::EncodingSettings;
use crate::error::{AnalyzerError, AnalyzerResult};

/// MIME prefix of the inline image reference sent to the model.
pub const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Output of one full preparation run.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Dimensions of the decoded upload
    pub original_size: Size,
    /// Dimensions after resizing
    pub processed_size: Size,
    /// Settings the image was prepared with
    pub settings: EncodingSettings,
    /// Encoded JPEG bytes
    pub jpeg: Vec<u8>,
    /// Base64 of `jpeg`
    pub payload: String,
}

impl PreparedImage {
    /// `data:image/jpeg;base64,<payload>`
    pub fn data_url(&self) -> String {
        data_url(&self.payload)
    }

    /// True when the resize step left the dimensions alone.
    pub fn was_resized(&self) -> bool {
        self.original_size != self.processed_size
    }
}

/// Runs the preparation steps. Holds a reusable resampler scratch buffer and
/// nothing else.
pub struct ImagePreparer {
    resizer: Resizer,
}

impl Default for ImagePreparer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImagePreparer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Run the whole pipeline over raw upload bytes.
    pub fn prepare(
        &mut self,
        bytes: &[u8],
        settings: EncodingSettings,
    ) -> AnalyzerResult<PreparedImage> {
        settings.validate()?;

        let decoded = decode(bytes)?;
        let (w, h) = decoded.dimensions();
        let original_size = Size { w, h };

        let rgb = normalize_color(decoded);
        let resized = self.resize_to_max(rgb, settings.max_dimension)?;
        let processed_size = Size {
            w: resized.width(),
            h: resized.height(),
        };

        let jpeg = encode_jpeg(&resized, settings.quality)?;
        let payload = to_base64_data_payload(&jpeg);

        log::info!(
            "Prepared image {} -> {} (quality {}, {} JPEG bytes, {} base64 chars)",
            original_size,
            processed_size,
            settings.quality,
            jpeg.len(),
            payload.len()
        );

        Ok(PreparedImage {
            original_size,
            processed_size,
            settings,
            jpeg,
            payload,
        })
    }

    /// Clamp the longest side to `max_dimension`, preserving aspect ratio.
    ///
    /// Images that already fit are returned as-is.
    pub fn resize_to_max(&mut self, image: RgbImage, max_dimension: u32) -> AnalyzerResult<RgbImage> {
        let input = Size {
            w: image.width(),
            h: image.height(),
        };
        if input.is_empty() {
            return Err(AnalyzerError::encode(
                "resize",
                format!("image has zero-size dimensions ({})", input),
            ));
        }
        if max_dimension == 0 {
            return Err(AnalyzerError::encode(
                "resize",
                "max dimension must be greater than 0",
            ));
        }

        let plan = build_plan(input, max_dimension);
        if plan.is_identity() {
            log::debug!("{} already fits within {}px, not resizing", input, max_dimension);
            return Ok(image);
        }

        let scaled = scale_rgb_cpu(&mut self.resizer, image.as_raw(), input, &plan)
            .map_err(|e| AnalyzerError::encode("resize", e.to_string()))?;

        log::debug!(
            "Resized {} -> {} (ratio {:.4}, Lanczos3)",
            input,
            plan.out,
            plan.ratio
        );

        RgbImage::from_raw(plan.out.w, plan.out.h, scaled)
            .ok_or_else(|| AnalyzerError::encode("resize", "scaled buffer length mismatch"))
    }
}

/// Decode an uploaded byte buffer into a raster.
pub fn decode(bytes: &[u8]) -> AnalyzerResult<DynamicImage> {
    if bytes.is_empty() {
        return Err(AnalyzerError::decode("input is empty"));
    }
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| AnalyzerError::decode(format!("could not read image header: {}", e)))?;
    let format = reader
        .format()
        .ok_or_else(|| AnalyzerError::decode("unrecognized image format"))?;
    let image = reader
        .decode()
        .map_err(|e| AnalyzerError::decode(e.to_string()))?;
    log::debug!(
        "Decoded {:?} upload: {}x{} {:?}",
        format,
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image)
}

/// Convert to three-channel 8-bit color. RGB8 input passes through untouched.
pub fn normalize_color(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => {
            log::debug!("Converting {:?} to Rgb8", other.color());
            other.to_rgb8()
        }
    }
}

/// Serialize as JPEG with optimized Huffman tables. Output is deterministic
/// for a given raster and quality.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> AnalyzerResult<Vec<u8>> {
    encode_jpeg_tables(image, quality, true)
}

fn encode_jpeg_tables(image: &RgbImage, quality: u8, optimized: bool) -> AnalyzerResult<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(AnalyzerError::encode(
            "jpeg",
            format!("quality must be between 1 and 100, got {}", quality),
        ));
    }
    if image.width() == 0 || image.height() == 0 {
        return Err(AnalyzerError::encode("jpeg", "cannot encode a zero-size image"));
    }
    // JPEG frame headers store 16-bit dimensions.
    let (Ok(w), Ok(h)) = (u16::try_from(image.width()), u16::try_from(image.height())) else {
        return Err(AnalyzerError::encode(
            "jpeg",
            format!(
                "{}x{} exceeds the JPEG limit of {} px per side",
                image.width(),
                image.height(),
                u16::MAX
            ),
        ));
    };

    let mut buffer = Vec::new();
    let mut encoder = Encoder::new(&mut buffer, quality);
    encoder.set_optimized_huffman_tables(optimized);
    encoder
        .encode(image.as_raw(), w, h, JpegColorType::Rgb)
        .map_err(|e| AnalyzerError::encode("jpeg", e.to_string()))?;
    Ok(buffer)
}

/// Standard base64 with padding.
pub fn to_base64_data_payload(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Wrap a base64 payload as a JPEG data URL.
pub fn data_url(payload: &str) -> String {
    format!("{}{}", DATA_URL_PREFIX, payload)
}
