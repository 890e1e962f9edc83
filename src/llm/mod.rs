//! Gemini generation client.
//!
//! One request shape: a text part carrying the prompt, optionally
//! followed by an inline-data part when the command arrived with a
//! usable attachment. The first candidate's first part is the answer.

pub mod http;

use crate::config::{Settings, GEMINI_BASE_URL};
use crate::media::MediaPayload;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::{json, Value};
use thiserror::Error;

/// Literal returned when a successful response carries no text part.
pub const NO_CONTENT_FALLBACK: &str = "No Content";

/// Failure kinds of a generation call.
#[derive(Debug, Error)]
pub enum GenError {
    /// Non-success HTTP status from the API
    #[error("API error: {0}")]
    Api(String),
    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),
    /// Response body was not valid JSON
    #[error("JSON error: {0}")]
    Json(String),
    /// No API key configured
    #[error("Missing API key: {0}")]
    MissingConfig(String),
}

/// Seam over the generation call so command orchestration can be
/// exercised with a scripted backend.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a text answer for `prompt`, optionally grounded in an
    /// inline media payload.
    async fn generate(&self, prompt: &str, media: Option<&MediaPayload>)
        -> Result<String, GenError>;
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http_client: HttpClient,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    /// Create a client from settings.
    ///
    /// A missing API key is not a constructor error: the command layer
    /// reports it per invocation, so the bot keeps running unconfigured.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            // No timeout: a hung call blocks only its own invocation's
            // status message.
            http_client: HttpClient::new(),
            api_key: settings.gemini_api.clone(),
            model: settings.model().to_string(),
        }
    }

    /// Whether an API key was configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, api_key: &str) -> String {
        format!("{GEMINI_BASE_URL}/{}:generateContent?key={api_key}", self.model)
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        media: Option<&MediaPayload>,
    ) -> Result<String, GenError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenError::MissingConfig("GEMINI_API".to_string()))?;

        let body = build_request_body(prompt, media);
        let res_json = http::send_json_request(&self.http_client, &self.endpoint(api_key), &body)
            .await?;
        Ok(parse_candidate_text(&res_json))
    }
}

/// Build the `generateContent` body: the prompt text part first, then an
/// inline-data part iff the payload carries a known MIME type.
///
/// A payload with `mime_type: None` (attachment of unknown type) is
/// deliberately dropped here; generation proceeds on the prompt alone.
#[must_use]
pub fn build_request_body(prompt: &str, media: Option<&MediaPayload>) -> Value {
    let mut parts = vec![json!({ "text": prompt })];
    if let Some(payload) = media {
        if let Some(mime_type) = &payload.mime_type {
            parts.push(json!({
                "inlineData": {
                    "mimeType": mime_type,
                    "data": payload.data,
                }
            }));
        }
    }
    json!({ "contents": [{ "parts": parts }] })
}

/// Extract the first candidate's first part's text, falling back to
/// [`NO_CONTENT_FALLBACK`] when the expected structure is absent.
#[must_use]
pub fn parse_candidate_text(response: &Value) -> String {
    response
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(Value::as_str)
        .map_or_else(|| NO_CONTENT_FALLBACK.to_string(), ToString::to_string)
}
