/// LLM Client: the single point of entry for all text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All generation goes through `GenerationClient`, which owns the timeout,
/// the fixed sampling/safety policy, and response extraction.
///
/// No retries happen here. `LlmError::reason()` exposes a `FailureReason`
/// for callers that want their own retry policy.
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub mod extract;
pub mod gemini;
pub mod prompts;

use gemini::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    SafetySetting,
};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const TOP_P: f32 = 0.95;
const TOP_K: u32 = 40;

/// Every harm category is switched off. Not overridable per request.
const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
];
const BLOCK_NONE: &str = "BLOCK_NONE";

// ────────────────────────────────────────────────────────────────────────────
// Failure taxonomy
// ────────────────────────────────────────────────────────────────────────────

/// Generic classification of a failed generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    BackendUnavailable,
    Timeout,
    ContentBlocked,
    Truncated,
    EmptyResponse,
    MalformedResponse,
    UnknownBackendError,
}

impl FailureReason {
    pub fn code(self) -> &'static str {
        match self {
            FailureReason::BackendUnavailable => "BACKEND_UNAVAILABLE",
            FailureReason::Timeout => "TIMEOUT",
            FailureReason::ContentBlocked => "CONTENT_BLOCKED",
            FailureReason::Truncated => "TRUNCATED",
            FailureReason::EmptyResponse => "EMPTY_RESPONSE",
            FailureReason::MalformedResponse => "MALFORMED_RESPONSE",
            FailureReason::UnknownBackendError => "UNKNOWN_BACKEND_ERROR",
        }
    }

    /// Recommended retry policy for callers. Blocked and empty completions
    /// repeat for the same prompt.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            FailureReason::Timeout
                | FailureReason::UnknownBackendError
                | FailureReason::BackendUnavailable
        )
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Backend call exceeded {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Content blocked: {0}")]
    ContentBlocked(String),

    #[error("Backend hit the token limit before producing any text")]
    Truncated,

    #[error("Backend returned no usable text")]
    EmptyResponse,

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Backend error: {0}")]
    Unknown(String),
}

impl LlmError {
    pub fn reason(&self) -> FailureReason {
        match self {
            LlmError::BackendUnavailable(_) => FailureReason::BackendUnavailable,
            LlmError::Timeout(_) => FailureReason::Timeout,
            LlmError::ContentBlocked(_) => FailureReason::ContentBlocked,
            LlmError::Truncated => FailureReason::Truncated,
            LlmError::EmptyResponse => FailureReason::EmptyResponse,
            LlmError::MalformedResponse(_) => FailureReason::MalformedResponse,
            LlmError::Unknown(_) => FailureReason::UnknownBackendError,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Backend seam
// ────────────────────────────────────────────────────────────────────────────

/// The text-generation backend. Production uses `gemini::GeminiBackend`;
/// tests substitute a stub.
#[async_trait]
pub trait TextBackend: Send + Sync {
    fn model(&self) -> &str;

    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Parameters
// ────────────────────────────────────────────────────────────────────────────

/// Service-wide fallbacks, read from config at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationDefaults {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Fully resolved settings for one backend call. Built per call, never shared.
#[derive(Debug, Clone)]
pub struct GenerationParameters {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
    pub safety_settings: Vec<SafetySetting>,
    pub timeout: Duration,
}

impl GenerationParameters {
    pub fn resolve(
        prompt: &str,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        defaults: &GenerationDefaults,
    ) -> Self {
        Self {
            prompt: prompt.to_string(),
            temperature: temperature.unwrap_or(defaults.temperature),
            max_tokens: max_tokens.unwrap_or(defaults.max_tokens),
            top_p: TOP_P,
            top_k: TOP_K,
            safety_settings: HARM_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: BLOCK_NONE,
                })
                .collect(),
            timeout: defaults.timeout,
        }
    }

    pub fn to_request(&self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(self.prompt.clone()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens,
                top_p: self.top_p,
                top_k: self.top_k,
            },
            safety_settings: self.safety_settings.clone(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Shared handle to the backend plus the service defaults. Cheap to clone.
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn TextBackend>,
    defaults: GenerationDefaults,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn TextBackend>, defaults: GenerationDefaults) -> Self {
        Self { backend, defaults }
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Sends one prompt and returns the cleaned quote text.
    ///
    /// On timeout the in-flight request future is dropped; the backend may
    /// keep working but nothing on this side waits for it.
    pub async fn generate(
        &self,
        prompt: &str,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<String, LlmError> {
        let params = GenerationParameters::resolve(prompt, max_tokens, temperature, &self.defaults);

        debug!(
            "Generation request: model={}, temperature={}, max_tokens={}",
            self.backend.model(),
            params.temperature,
            params.max_tokens
        );

        let request = params.to_request();
        let response =
            match tokio::time::timeout(params.timeout, self.backend.generate_content(&request))
                .await
            {
                Ok(result) => result?,
                Err(_) => {
                    warn!(
                        "Backend call abandoned after {}s",
                        params.timeout.as_secs()
                    );
                    return Err(LlmError::Timeout(params.timeout));
                }
            };

        let quote = extract::extract_quote(&response)?;
        debug!("Generated quote ({} chars)", quote.len());

        Ok(quote)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test support
// ────────────────────────────────────────────────────────────────────────────
