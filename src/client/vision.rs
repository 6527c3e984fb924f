//! # Vision Model Client
//!
//! Builds a single-message chat completion request carrying the prepared photo
//! as a `data:image/jpeg;base64,...` URL plus a fixed nutrition prompt, sends
//! it once, and hands back the model's text untouched.
//!
//! HTTP failures are mapped onto the typed variants of [`AnalyzerError`]:
//!
//! | Condition | Variant |
//! |-----------|---------|
//! | 401 / 403 | `Auth` |
//! | 429 | `RateLimited` (honours `Retry-After`) |
//! | request timeout | `Timeout` |
//! | connect / transport failure | `Network` |
//! | any other non-2xx | `Api` |
//! | 2xx without `choices[0].message.content` | `InvalidResponse` |
//!
//! Nothing is retried.

use std::time::Duration;

use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};

use crate::config::ModelOptions;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::processing::PreparedImage;

/// Instruction sent alongside every photo.
pub const NUTRITION_PROMPT: &str = "Analyze this food image and provide detailed nutritional information in the following format:

Calories: [number] kcal
Protein: [number] g
Fiber: [number] g
Carbohydrates: [number] g
Fat: [number] g
Main Ingredients: [list main ingredients]
Allergens: [list potential allergens]
Additional Notes: [any other relevant nutritional information]

Please be as precise as possible with the measurements.";

/// Longest slice of an error body quoted back to the user.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// One outbound analysis call.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub model: String,
    /// Full `data:` URL of the prepared JPEG
    pub image_url: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl AnalysisRequest {
    /// Request the fixed nutrition breakdown for a prepared photo.
    pub fn nutrition(image: &PreparedImage, options: &ModelOptions) -> Self {
        Self {
            model: options.model.clone(),
            image_url: image.data_url(),
            prompt: NUTRITION_PROMPT.to_string(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }

    fn body(&self) -> ChatCompletionRequest<'_> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: &self.image_url,
                        },
                    },
                    ContentPart::Text { text: &self.prompt },
                ],
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// The exact JSON body sent to the service.
    pub fn to_json(&self) -> serde_json::Value {
        // Serializing plain strings and numbers cannot fail.
        serde_json::to_value(self.body()).unwrap_or(serde_json::Value::Null)
    }
}

/// Token accounting reported by the service, when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// The model's answer, displayed verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub text: String,
    /// Model name echoed by the service
    pub model: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl AnalysisResult {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
            usage: None,
        }
    }
}

/// Anything that can turn an [`AnalysisRequest`] into text.
pub trait VisionModel {
    fn analyze(&self, request: &AnalysisRequest) -> AnalyzerResult<AnalysisResult>;
}

impl<T: VisionModel + ?Sized> VisionModel for &T {
    fn analyze(&self, request: &AnalysisRequest) -> AnalyzerResult<AnalysisResult> {
        (**self).analyze(request)
    }
}

impl<T: VisionModel + ?Sized> VisionModel for Box<T> {
    fn analyze(&self, request: &AnalysisRequest) -> AnalyzerResult<AnalysisResult> {
        (**self).analyze(request)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    ImageUrl { image_url: ImageUrl<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Blocking HTTP implementation of [`VisionModel`].
pub struct VisionClient {
    http: HttpClient,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl std::fmt::Debug for VisionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl VisionClient {
    pub fn new(api_key: impl Into<String>, options: &ModelOptions) -> AnalyzerResult<Self> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(AnalyzerError::config("api_key", "", "must not be empty")
                .with_recovery_suggestion("Generate an API key from your Groq dashboard"));
        }
        let http = HttpClient::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| AnalyzerError::network("client setup", e.to_string()).with_source(e))?;
        Ok(Self {
            http,
            api_key,
            endpoint: options.endpoint.clone(),
            timeout: options.timeout,
        })
    }

    fn map_send_error(&self, error: reqwest::Error) -> AnalyzerError {
        if error.is_timeout() {
            return AnalyzerError::timeout("chat completion", self.timeout.as_millis() as u64);
        }
        let reason = if error.is_connect() {
            format!("could not connect to {}", self.endpoint)
        } else {
            error.to_string()
        };
        AnalyzerError::network("chat completion", reason).with_source(error)
    }
}

impl VisionModel for VisionClient {
    fn analyze(&self, request: &AnalysisRequest) -> AnalyzerResult<AnalysisResult> {
        log::info!(
            "Sending {} ({} byte image URL) to {}",
            request.model,
            request.image_url.len(),
            self.endpoint
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request.body())
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let result = parse_response(response)?;
        if let Some(usage) = result.usage {
            log::debug!(
                "Token usage: prompt={} completion={} total={}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }
        Ok(result)
    }
}

fn parse_response(response: HttpResponse) -> AnalyzerResult<AnalysisResult> {
    let status = response.status();
    let code = status.as_u16();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response
        .text()
        .map_err(|e| AnalyzerError::network("reading response body", e.to_string()).with_source(e))?;

    if !status.is_success() {
        let message = error_message(&body);
        log::warn!("Vision service returned HTTP {}", code);
        return Err(match code {
            401 | 403 => AnalyzerError::auth(code, message),
            429 => AnalyzerError::rate_limited(message, retry_after),
            _ => AnalyzerError::api(code, message),
        });
    }

    let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;
    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| AnalyzerError::invalid_response("no message content in first choice"))?;

    Ok(AnalysisResult {
        text,
        model: parsed.model,
        usage: parsed.usage,
    })
}

/// Prefer the service's `{"error":{"message":..}}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => truncate_text(body.trim(), MAX_ERROR_BODY_CHARS),
    }
}

fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingSettings;
    use plate_scale::presets::Size;

    fn prepared() -> PreparedImage {
        PreparedImage {
            original_size: Size { w: 2, h: 2 },
            processed_size: Size { w: 2, h: 2 },
            settings: EncodingSettings::default(),
            jpeg: vec![0xFF, 0xD8],
            payload: "/9g=".to_string(),
        }
    }

    #[test]
    fn request_body_matches_chat_format() {
        let request = AnalysisRequest::nutrition(&prepared(), &ModelOptions::default());
        let json = request.to_json();

        assert_eq!(json["model"], "llama-3.2-11b-vision-preview");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);

        let message = &json["messages"][0];
        assert_eq!(message["role"], "user");
        assert_eq!(message["content"][0]["type"], "image_url");
        assert_eq!(
            message["content"][0]["image_url"]["url"],
            "data:image/jpeg;base64,/9g="
        );
        assert_eq!(message["content"][1]["type"], "text");
        assert_eq!(message["content"][1]["text"], NUTRITION_PROMPT);
    }

    #[test]
    fn temperature_is_serialized() {
        let request = AnalysisRequest::nutrition(&prepared(), &ModelOptions::default());
        let temperature = request.to_json()["temperature"].as_f64().unwrap();
        assert!((temperature - 0.1).abs() < 1e-6);
    }

    #[test]
    fn prompt_lists_every_field() {
        for label in [
            "Calories:",
            "Protein:",
            "Fiber:",
            "Carbohydrates:",
            "Fat:",
            "Main Ingredients:",
            "Allergens:",
            "Additional Notes:",
        ] {
            assert!(NUTRITION_PROMPT.contains(label), "missing {}", label);
        }
    }

    #[test]
    fn error_message_prefers_service_message() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Invalid API Key");
        assert_eq!(error_message("  upstream exploded  "), "upstream exploded");
    }

    #[test]
    fn truncates_long_bodies() {
        let long = "x".repeat(600);
        let out = truncate_text(&long, 512);
        assert_eq!(out.chars().count(), 513);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = VisionClient::new("   ", &ModelOptions::default()).unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn debug_output_hides_key() {
        let client = VisionClient::new("gsk_secret", &ModelOptions::default()).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("gsk_secret"));
        assert!(debug.contains("<redacted>"));
    }
}
