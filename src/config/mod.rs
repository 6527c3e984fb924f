//! # Configuration Module
//!
//! Encoding settings and model call parameters for an analysis run.

pub mod config;

pub use config::{AnalyzerConfig, EncodingSettings, ModelOptions};
