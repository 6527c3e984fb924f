//! # Processing Module
//!
//! The photo preparation pipeline: decode, color normalization, bounded
//! resize, JPEG encoding and base64 payload construction.

pub mod preparer;

pub use preparer::{
    DATA_URL_PREFIX, ImagePreparer, PreparedImage, data_url, decode, encode_jpeg, normalize_color,
    to_base64_data_payload,
};
