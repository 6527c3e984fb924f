//! # Error Handling
//!
//! Every failure the analyzer can report is an [`AnalyzerError`]. Each variant
//! carries an [`ErrorContext`] with the operation, optional free-form context,
//! a recovery suggestion for the user, and a severity level.
//!
//! ## Error Classification
//!
//! - `Retryable`: the user may simply run the same action again
//! - `HasSeverity` / `HasRecoverySuggestion`: metadata for rendering
//! - [`classify`]: fatal / transient / needs-user-action helpers
//!
//! The analyzer itself never retries; classification only informs what the
//! front end tells the user.
//!
//! ## Usage
//!
//! ```rust
//! use food_nutrition_analyzer::error::{AnalyzerError, Retryable};
//!
//! let error = AnalyzerError::decode("unsupported image format")
//!     .with_context("reading upload 'lunch.heic'");
//!
//! assert_eq!(error.category(), "decode");
//! assert!(!error.is_retryable());
//! ```

use std::{collections::HashMap, error::Error as StdError, time::SystemTime};

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Warnings that may indicate potential issues
    Warning,
    /// The current action failed; the user may try again
    Error,
    /// Requires the user to change something before trying again
    Critical,
    /// Fatal errors that cannot be recovered from
    Fatal,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
    /// Additional metadata as key-value pairs
    pub metadata: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity: ErrorSeverity::Error,
            metadata: HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the operation that was being performed
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Add additional context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Set recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Set severity level
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// Base error type for the nutrition analyzer
#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    /// The uploaded bytes are not a decodable image
    #[error("Could not decode image: {reason}")]
    Decode {
        reason: String,
        context: ErrorContext,
    },
    /// Resizing or JPEG encoding failed
    #[error("Could not encode image during {stage}: {reason}")]
    Encode {
        stage: String,
        reason: String,
        context: ErrorContext,
    },
    /// Configuration validation errors
    #[error("Configuration error in '{field}': {reason} (value: {value})")]
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors
    #[error("I/O error during {operation}{}: {source}", path_suffix(.path))]
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
    /// The service rejected the credential
    #[error("Authentication failed (HTTP {status}): {message}")]
    Auth {
        status: u16,
        message: String,
        context: ErrorContext,
    },
    /// The service is throttling requests
    #[error("Rate limited by the vision service: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: Option<u64>,
        context: ErrorContext,
    },
    /// Timeout errors
    #[error("Timeout during {operation} after {duration_ms}ms")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },
    /// Transport-level failures (DNS, connect, TLS, broken pipe)
    #[error("Network error during {operation}: {reason}")]
    Network {
        operation: String,
        reason: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
        context: ErrorContext,
    },
    /// Any other non-success HTTP status
    #[error("Vision service returned HTTP {status}: {body}")]
    Api {
        status: u16,
        body: String,
        context: ErrorContext,
    },
    /// A success status whose body lacks the expected answer
    #[error("Unexpected response from vision service: {reason}")]
    InvalidResponse {
        reason: String,
        context: ErrorContext,
    },
}

fn path_suffix(path: &Option<String>) -> String {
    path.as_ref()
        .map(|p| format!(" on '{}'", p))
        .unwrap_or_default()
}

impl AnalyzerError {
    /// Create a decode error
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
            context: ErrorContext::new()
                .with_recovery_suggestion("Upload a JPEG or PNG photo")
                .with_severity(ErrorSeverity::Critical),
        }
    }

    /// Create an encode error
    pub fn encode(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encode {
            stage: stage.into(),
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Fatal),
        }
    }

    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Critical),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, path: Option<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an authentication error
    pub fn auth(status: u16, message: impl Into<String>) -> Self {
        Self::Auth {
            status,
            message: message.into(),
            context: ErrorContext::new()
                .with_recovery_suggestion("Check that the API key is correct and still active")
                .with_severity(ErrorSeverity::Critical),
        }
    }

    /// Create a rate limit error
    pub fn rate_limited(message: impl Into<String>, retry_after_secs: Option<u64>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_secs,
            context: ErrorContext::new()
                .with_recovery_suggestion("Wait a moment before analyzing another photo")
                .with_severity(ErrorSeverity::Warning),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration_ms,
            context: ErrorContext::new()
                .with_recovery_suggestion("Try again, or lower the max image size to shrink the upload")
                .with_severity(ErrorSeverity::Error),
        }
    }

    /// Create a network error
    pub fn network(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            operation: operation.into(),
            reason: reason.into(),
            source: None,
            context: ErrorContext::new()
                .with_recovery_suggestion("Check your internet connection and try again")
                .with_severity(ErrorSeverity::Error),
        }
    }

    /// Create an API status error
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Attach the underlying transport error to a network error.
    /// No-op on other variants.
    pub fn with_source(mut self, error: impl StdError + Send + Sync + 'static) -> Self {
        if let Self::Network { source, .. } = &mut self {
            *source = Some(Box::new(error));
        }
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Set severity
    pub fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.context_mut().severity = severity;
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.insert(key.into(), value.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Decode { context, .. } => context,
            Self::Encode { context, .. } => context,
            Self::Config { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::Auth { context, .. } => context,
            Self::RateLimited { context, .. } => context,
            Self::Timeout { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::Api { context, .. } => context,
            Self::InvalidResponse { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Decode { context, .. } => context,
            Self::Encode { context, .. } => context,
            Self::Config { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::Auth { context, .. } => context,
            Self::RateLimited { context, .. } => context,
            Self::Timeout { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::Api { context, .. } => context,
            Self::InvalidResponse { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Encode { .. } => "encode",
            Self::Config { .. } => "config",
            Self::Io { .. } => "io",
            Self::Auth { .. } => "auth",
            Self::RateLimited { .. } => "rate_limited",
            Self::Timeout { .. } => "timeout",
            Self::Network { .. } => "network",
            Self::Api { .. } => "api",
            Self::InvalidResponse { .. } => "invalid_response",
        }
    }

    /// True for failures that happen before any request is sent
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::Encode { .. } | Self::Config { .. } | Self::Io { .. }
        )
    }
}

/// Result type alias using our custom error type
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

/// Trait for errors where running the same action again may succeed
pub trait Retryable {
    /// Check if this error can be retried
    fn is_retryable(&self) -> bool;

    /// Get the recommended wait before trying again, in milliseconds
    fn retry_delay_ms(&self) -> Option<u64> {
        None
    }
}

impl Retryable for AnalyzerError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited {
                retry_after_secs: Some(secs),
                ..
            } => Some(secs.saturating_mul(1000)),
            Self::RateLimited { .. } => Some(5000),
            Self::Timeout { .. } => Some(1000),
            Self::Network { .. } => Some(2000),
            _ => None,
        }
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for AnalyzerError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for AnalyzerError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Check if an error is transient (may resolve itself)
    pub fn is_transient(error: &AnalyzerError) -> bool {
        matches!(
            error,
            AnalyzerError::Timeout { .. }
                | AnalyzerError::Network { .. }
                | AnalyzerError::RateLimited { .. }
        )
    }

    /// Check if an error is fatal (the same input will always fail)
    pub fn is_fatal(error: &AnalyzerError) -> bool {
        matches!(
            error,
            AnalyzerError::Decode { .. } | AnalyzerError::Encode { .. } | AnalyzerError::Config { .. }
        ) || error.severity() == ErrorSeverity::Fatal
    }

    /// Check if an error requires user intervention
    pub fn requires_user_intervention(error: &AnalyzerError) -> bool {
        error.severity() >= ErrorSeverity::Critical
    }
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(error: serde_json::Error) -> Self {
        Self::invalid_response(format!("invalid JSON payload: {}", error))
    }
}
