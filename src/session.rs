//! # Analysis Session
//!
//! One user action end to end: prepare the photo with the configured
//! settings, then hand it to a [`VisionModel`]. Decode and encode failures
//! stop the run before the model is contacted.

use std::path::Path;

use crate::client::{AnalysisRequest, AnalysisResult, VisionModel};
use crate::config::AnalyzerConfig;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::processing::{ImagePreparer, PreparedImage};

/// Shown under every analysis.
pub const DISCLAIMER: &str = "Note: These are estimated values and may vary from actual nutritional content. Please consult a professional nutritionist for accurate information.";

/// Upload extensions the front end accepts.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Everything produced by a completed run.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub prepared: PreparedImage,
    pub result: AnalysisResult,
}

/// Orchestrates preparation and the model call for a fixed configuration.
pub struct AnalysisSession<M: VisionModel> {
    config: AnalyzerConfig,
    model: M,
    preparer: ImagePreparer,
}

impl<M: VisionModel> AnalysisSession<M> {
    /// Validates `config` up front so a bad setting fails before any image work.
    pub fn new(config: AnalyzerConfig, model: M) -> AnalyzerResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            model,
            preparer: ImagePreparer::new(),
        })
    }

    /// Run only the preparation pipeline.
    pub fn preview(&mut self, image_bytes: &[u8]) -> AnalyzerResult<PreparedImage> {
        self.preparer.prepare(image_bytes, self.config.encoding)
    }

    /// Ask the model about an already prepared photo.
    pub fn analyze(&self, prepared: &PreparedImage) -> AnalyzerResult<AnalysisResult> {
        let request = AnalysisRequest::nutrition(prepared, &self.config.to_model_options());
        let result = self.model.analyze(&request)?;
        log::info!("Received {} characters of analysis", result.text.len());
        Ok(result)
    }

    /// Prepare the photo and ask the model for a nutrition breakdown.
    pub fn run(&mut self, image_bytes: &[u8]) -> AnalyzerResult<AnalysisReport> {
        let prepared = self.preview(image_bytes)?;
        let result = self.analyze(&prepared)?;
        Ok(AnalysisReport { prepared, result })
    }
}

/// Inline message for a failed analysis.
pub fn render_failure(error: &AnalyzerError) -> String {
    format!("Error analyzing image: {}", error)
}

/// Reject uploads whose extension is not one of [`ACCEPTED_EXTENSIONS`].
pub fn check_extension(path: &Path) -> AnalyzerResult<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(AnalyzerError::config(
            "image",
            path.display().to_string(),
            format!("file type must be one of: {}", ACCEPTED_EXTENSIONS.join(", ")),
        ))
    }
}

/// Read an upload from disk after checking its extension.
pub fn read_upload(path: &Path) -> AnalyzerResult<Vec<u8>> {
    check_extension(path)?;
    std::fs::read(path)
        .map_err(|e| AnalyzerError::io("read image", Some(path.display().to_string()), e))
}
