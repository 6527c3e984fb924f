//! # Food Nutrition Analyzer Library
//!
//! Prepares a food photo for a hosted vision-language model and asks that
//! model for a labeled nutrition estimate.
//!
//! ## Architecture
//!
//! - `processing`: decode, color normalization, bounded resize, JPEG, base64
//! - `client`: chat completion request construction and the HTTP call
//! - `session`: one user action end to end, plus upload checks and rendering
//! - `config`: encoding settings and model parameters with validation
//! - `error`: typed errors with severity and recovery suggestions
//!
//! Resampling itself lives in the `plate-scale` workspace crate.
//!
//! ## Example
//!
//! ```rust,no_run
//! use food_nutrition_analyzer::{AnalysisSession, AnalyzerConfig, VisionClient};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AnalyzerConfig::default();
//! let client = VisionClient::new("gsk_...", &config.to_model_options())?;
//! let mut session = AnalysisSession::new(config, client)?;
//!
//! let bytes = std::fs::read("lunch.jpg")?;
//! let report = session.run(&bytes)?;
//! println!("{}", report.result.text);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod processing;
pub mod session;

pub use client::{AnalysisRequest, AnalysisResult, VisionClient, VisionModel};
pub use config::{AnalyzerConfig, EncodingSettings, ModelOptions};
pub use error::{
    AnalyzerError, AnalyzerResult, ErrorSeverity, HasRecoverySuggestion, HasSeverity, Retryable,
};
pub use plate_scale::presets::Size;
pub use processing::{ImagePreparer, PreparedImage};
pub use session::{AnalysisReport, AnalysisSession, render_failure};

/// Run the preparation pipeline once with a throwaway preparer.
///
/// ```rust
/// use food_nutrition_analyzer::{prepare_image, EncodingSettings};
///
/// let err = prepare_image(b"not a photo", EncodingSettings::default()).unwrap_err();
/// assert_eq!(err.category(), "decode");
/// ```
pub fn prepare_image(bytes: &[u8], settings: EncodingSettings) -> AnalyzerResult<PreparedImage> {
    ImagePreparer::new().prepare(bytes, settings)
}
