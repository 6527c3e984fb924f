//! # Vision Client Module
//!
//! Request construction and the blocking HTTP call to an OpenAI-compatible
//! chat completions endpoint that accepts inline images.

pub mod vision;

pub use vision::{AnalysisRequest, AnalysisResult, NUTRITION_PROMPT, TokenUsage, VisionClient, VisionModel};
