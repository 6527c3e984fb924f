//! # Configuration Module
//!
//! Configuration structures and validation for a single analysis run. The same
//! structures back the command-line front end and any embedding application.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `max_dimension` | `u32` | > 0 (UI: 400-1200, step 100) | Longest side after resizing |
//! | `quality` | `u8` | 1-100 (UI: 50-100, step 5) | JPEG quality |
//! | `endpoint` | `String` | http(s) URL | OpenAI-compatible chat completions URL |
//! | `model` | `String` | non-empty | Vision model identifier |
//! | `temperature` | `f32` | 0.0-2.0 | Sampling temperature |
//! | `max_tokens` | `u32` | > 0 | Completion length cap |
//! | `timeout_secs` | `u64` | > 0 | Request timeout |
//!
//! ## Examples
//!
//! ```rust
//! use food_nutrition_analyzer::config::config::{AnalyzerConfig, EncodingSettings};
//!
//! let config = AnalyzerConfig::default();
//! assert_eq!(config.encoding, EncodingSettings { max_dimension: 800, quality: 85 });
//! assert!(config.validate().is_ok());
//!
//! let options = config.to_model_options();
//! assert_eq!(options.max_tokens, 1000);
//! ```

use std::time::Duration;

use crate::error::{AnalyzerError, AnalyzerResult};

/// Default chat completions endpoint (Groq's OpenAI-compatible API).
pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "llama-3.2-11b-vision-preview";

/// Environment variable consulted for the API key when none is passed explicitly.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Range and step of the "Max Image Size" control.
pub const MAX_DIMENSION_RANGE: (u32, u32) = (400, 1200);
pub const MAX_DIMENSION_STEP: u32 = 100;

/// Range and step of the "Image Quality" control.
pub const QUALITY_RANGE: (u8, u8) = (50, 100);
pub const QUALITY_STEP: u8 = 5;

/// Per-request image encoding settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingSettings {
    /// Largest allowed size of the longer image side after resizing.
    pub max_dimension: u32,
    /// JPEG quality in `1..=100`.
    pub quality: u8,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            max_dimension: 800,
            quality: 85,
        }
    }
}

impl EncodingSettings {
    pub fn new(max_dimension: u32, quality: u8) -> Self {
        Self {
            max_dimension,
            quality,
        }
    }

    /// Checks the encoder's own domain: a positive bound and a quality in 1..=100.
    ///
    /// Violations are encode failures, since the pipeline cannot produce output
    /// with them.
    pub fn validate(&self) -> AnalyzerResult<()> {
        if self.max_dimension == 0 {
            return Err(AnalyzerError::encode(
                "resize",
                "max dimension must be greater than 0",
            ));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(AnalyzerError::encode(
                "jpeg",
                format!("quality must be between 1 and 100, got {}", self.quality),
            ));
        }
        Ok(())
    }
}

/// Model call parameters handed to the vision client.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOptions {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for ModelOptions {
    fn default() -> Self {
        AnalyzerConfig::default().to_model_options()
    }
}

/// Complete configuration for an analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Resize and JPEG settings.
    pub encoding: EncodingSettings,

    /// Chat completions URL of an OpenAI-compatible service.
    pub endpoint: String,

    /// Vision model identifier sent with every request.
    pub model: String,

    /// Sampling temperature. Kept low so the labeled lines come back stable.
    pub temperature: f32,

    /// Upper bound on generated tokens.
    pub max_tokens: u32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    /// Defaults:
    /// - `encoding`: 800px, quality 85
    /// - `endpoint`: Groq chat completions
    /// - `model`: `llama-3.2-11b-vision-preview`
    /// - `temperature`: 0.1
    /// - `max_tokens`: 1000
    /// - `timeout_secs`: 60
    fn default() -> Self {
        Self {
            encoding: EncodingSettings::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            max_tokens: 1000,
            timeout_secs: 60,
        }
    }
}

impl AnalyzerConfig {
    /// Creates a configuration with the given encoding settings and default
    /// model parameters.
    pub fn new(encoding: EncodingSettings) -> Self {
        Self {
            encoding,
            ..Self::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> AnalyzerResult<()> {
        self.encoding.validate()?;
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(AnalyzerError::config(
                "endpoint",
                &self.endpoint,
                "must be an http:// or https:// URL",
            ));
        }
        if self.model.trim().is_empty() {
            return Err(AnalyzerError::config("model", &self.model, "must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AnalyzerError::config(
                "temperature",
                self.temperature.to_string(),
                "must be between 0.0 and 2.0",
            ));
        }
        if self.max_tokens == 0 {
            return Err(AnalyzerError::config("max_tokens", "0", "must be greater than 0"));
        }
        if self.timeout_secs == 0 {
            return Err(AnalyzerError::config("timeout_secs", "0", "must be greater than 0"));
        }
        Ok(())
    }

    /// Convert to the options consumed by [`crate::client::VisionClient`].
    pub fn to_model_options(&self) -> ModelOptions {
        ModelOptions {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Check a value against one of the UI control ranges.
///
/// Returns a human-readable reason on failure, for use as a clap value parser.
pub fn check_stepped_range(value: u32, min: u32, max: u32, step: u32) -> Result<u32, String> {
    if value < min || value > max {
        return Err(format!("must be between {} and {}", min, max));
    }
    if (value - min) % step != 0 {
        return Err(format!("must be a multiple of {} starting at {}", step, min));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.encoding.max_dimension, 800);
        assert_eq!(config.encoding.quality, 85);
        assert_eq!(config.model, "llama-3.2-11b-vision-preview");
        assert_eq!(config.max_tokens, 1000);
        assert!((config.temperature - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());

        config.encoding.max_dimension = 0;
        assert_eq!(config.validate().unwrap_err().category(), "encode");
        config.encoding.max_dimension = 800;

        config.encoding.quality = 0;
        assert!(config.validate().is_err());
        config.encoding.quality = 101;
        assert!(config.validate().is_err());
        config.encoding.quality = 1;
        assert!(config.validate().is_ok());
        config.encoding.quality = 85;

        config.endpoint = "ftp://example.com".to_string();
        assert_eq!(config.validate().unwrap_err().category(), "config");
        config.endpoint = DEFAULT_ENDPOINT.to_string();

        config.model = "  ".to_string();
        assert!(config.validate().is_err());
        config.model = DEFAULT_MODEL.to_string();

        config.temperature = 3.0;
        assert!(config.validate().is_err());
        config.temperature = 0.1;

        config.timeout_secs = 0;
        assert!(config.validate().is_err());
        config.timeout_secs = 60;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_model_options_conversion() {
        let config = AnalyzerConfig {
            timeout_secs: 5,
            ..AnalyzerConfig::default()
        };
        let options = config.to_model_options();
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_stepped_range() {
        let (min, max) = MAX_DIMENSION_RANGE;
        assert_eq!(check_stepped_range(800, min, max, MAX_DIMENSION_STEP), Ok(800));
        assert!(check_stepped_range(850, min, max, MAX_DIMENSION_STEP).is_err());
        assert!(check_stepped_range(300, min, max, MAX_DIMENSION_STEP).is_err());
        assert!(check_stepped_range(1300, min, max, MAX_DIMENSION_STEP).is_err());
        assert_eq!(check_stepped_range(95, 50, 100, 5), Ok(95));
        assert!(check_stepped_range(92, 50, 100, 5).is_err());
    }
}
