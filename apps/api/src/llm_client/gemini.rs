//! Gemini `generateContent` wire types and the reqwest-backed [`TextBackend`].
//!
//! Only the fields the quote pipeline reads are modelled. Everything else in the
//! reply is ignored by serde.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{LlmError, TextBackend};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

#[cfg(test)]
impl GenerateContentRequest {
    /// Text of the first user part. This is the composed prompt.
    pub fn prompt_text(&self) -> Option<&str> {
        self.contents
            .first()
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetySetting {
    pub category: &'static str,
    pub threshold: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────
// Response
// ────────────────────────────────────────────────────────────────────────────

/// A backend reply. Text may arrive at the top level, inside the primary
/// candidate's parts, or directly on the candidate, depending on the path
/// the reply took (SDK shim, proxy, or raw REST).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    pub fn primary_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Why the backend stopped generating. Codes this service does not know
/// about collapse into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    FinishReasonUnspecified,
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Blocklist,
    ProhibitedContent,
    Spii,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Backend
// ────────────────────────────────────────────────────────────────────────────

/// Gemini REST backend. Built once at startup and shared by every request.
pub struct GeminiBackend {
    http: Client,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    /// Fails with `BackendUnavailable` when the key is blank so the service
    /// never starts half-configured.
    pub fn new(api_key: String, model: String) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::BackendUnavailable(
                "GEMINI_API_KEY is empty".to_string(),
            ));
        }

        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| LlmError::BackendUnavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl TextBackend for GeminiBackend {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError> {
        let url = format!("{GEMINI_API_BASE}/models/{}:generateContent", self.model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("Gemini API returned {status}: {message}");
            return Err(classify_status(status, message));
        }

        let body = response.text().await.map_err(map_transport_error)?;
        debug!("Gemini reply received ({} bytes)", body.len());

        serde_json::from_str(&body).map_err(|e| LlmError::MalformedResponse(e.to_string()))
    }
}

fn map_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        warn!("Gemini transport timed out: {e}");
        LlmError::Timeout(CONNECT_TIMEOUT)
    } else if e.is_connect() {
        LlmError::BackendUnavailable(e.to_string())
    } else if e.is_decode() || e.is_body() {
        LlmError::MalformedResponse(e.to_string())
    } else {
        LlmError::Unknown(e.to_string())
    }
}

fn classify_status(status: StatusCode, message: String) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::BackendUnavailable(format!("credential rejected ({status}): {message}"))
        }
        StatusCode::SERVICE_UNAVAILABLE => {
            LlmError::BackendUnavailable(format!("{status}: {message}"))
        }
        _ => LlmError::Unknown(format!("{status}: {message}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::FailureReason;

    #[test]
    fn test_blank_api_key_fails_fast() {
        let err = GeminiBackend::new("  ".to_string(), "gemini-1.5-flash".to_string())
            .err()
            .expect("blank key must be rejected");
        assert_eq!(err.reason(), FailureReason::BackendUnavailable);
    }

    #[test]
    fn test_response_deserializes_candidate_parts() {
        let json = serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello"}, {"text": "world"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12}
        });
        let response: GenerateContentResponse = serde_json::from_value(json).unwrap();
        let candidate = response.primary_candidate().unwrap();
        assert_eq!(candidate.finish_reason, Some(FinishReason::Stop));
        assert_eq!(candidate.content.as_ref().unwrap().parts.len(), 2);
        assert!(response.text.is_none());
    }

    #[test]
    fn test_unknown_finish_reason_maps_to_other() {
        let json = serde_json::json!({
            "candidates": [{"finishReason": "MALFORMED_FUNCTION_CALL"}]
        });
        let response: GenerateContentResponse = serde_json::from_value(json).unwrap();
        assert_eq!(
            response.primary_candidate().unwrap().finish_reason,
            Some(FinishReason::Other)
        );
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some("Create a love quote.".to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                max_output_tokens: 256,
                top_p: 0.95,
                top_k: 40,
            },
            safety_settings: vec![SafetySetting {
                category: "HARM_CATEGORY_HARASSMENT",
                threshold: "BLOCK_NONE",
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 256);
        assert_eq!(value["generationConfig"]["topK"], 40);
        assert_eq!(value["safetySettings"][0]["threshold"], "BLOCK_NONE");
        assert_eq!(request.prompt_text(), Some("Create a love quote."));
    }

    #[tokio::test]
    async fn test_transport_timeout_maps_to_timeout() {
        // Accepts the connection but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let http = Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        let err = http.get(format!("http://{addr}/")).send().await.unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(map_transport_error(err).reason(), FailureReason::Timeout);
        drop(listener);
    }

    #[tokio::test]
    async fn test_refused_connection_maps_to_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = Client::new()
            .get(format!("http://{addr}/"))
            .send()
            .await
            .unwrap_err();

        assert_eq!(
            map_transport_error(err).reason(),
            FailureReason::BackendUnavailable
        );
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, "bad key".to_string()).reason(),
            FailureReason::BackendUnavailable
        );
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, "overloaded".to_string()).reason(),
            FailureReason::BackendUnavailable
        );
        assert_eq!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, "quota".to_string()).reason(),
            FailureReason::UnknownBackendError
        );
    }
}
