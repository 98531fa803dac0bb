//! Quote service: compose → generate → stamp.
//!
//! Owns the injected `GenerationClient`. One instance is built at startup and
//! shared by every request through `AppState`.

use chrono::{SecondsFormat, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn, Level};

use crate::llm_client::{FailureReason, GenerationClient, LlmError};
use crate::quotes::models::{GeneratedQuote, GenerationRequest, LengthClass, QuoteCategory, AUTHOR};
use crate::quotes::prompts::{compose, PromptError};

/// Prompt characters kept in failure logs.
const PROMPT_LOG_CHARS: usize = 80;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error(transparent)]
    InvalidInput(#[from] PromptError),

    #[error(transparent)]
    Generation(#[from] LlmError),
}

pub struct QuoteService {
    client: GenerationClient,
}

impl QuoteService {
    pub fn new(client: GenerationClient) -> Self {
        Self { client }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Runs one end-to-end generation. Never retries; the returned
    /// `FailureReason` (via `LlmError::reason`) is the caller's retry signal.
    pub async fn generate_quote(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedQuote, QuoteError> {
        let category = QuoteCategory::resolve(request.category.as_deref());
        let length = request
            .length
            .as_deref()
            .unwrap_or(LengthClass::default().as_str());

        let prompt = match compose(
            request.category.as_deref(),
            request.topic.as_deref(),
            request.style.as_deref(),
            length,
        ) {
            Ok(prompt) => prompt,
            Err(e) => {
                debug!("Rejected quote request: {e}");
                return Err(e.into());
            }
        };

        let quote = match self
            .client
            .generate(&prompt, request.max_tokens, request.temperature)
            .await
        {
            Ok(quote) => quote,
            Err(e) => {
                let preview: String = prompt.chars().take(PROMPT_LOG_CHARS).collect();
                if failure_level(e.reason()) == Level::WARN {
                    warn!(
                        "Quote generation failed [{}] category={category} length={length} prompt={preview:?}: {e}",
                        e.reason()
                    );
                } else {
                    error!(
                        "Quote generation failed [{}] category={category} length={length} prompt={preview:?}: {e}",
                        e.reason()
                    );
                }
                return Err(e.into());
            }
        };

        info!("Generated {category} quote ({} chars)", quote.len());

        Ok(GeneratedQuote {
            quote,
            author: AUTHOR.to_string(),
            category: category.as_str().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    /// Sugar for a fully defaulted request in the `random` category.
    pub async fn random_quote(&self) -> Result<GeneratedQuote, QuoteError> {
        self.generate_quote(&GenerationRequest::random()).await
    }
}

/// The one place generation failures are logged. Retryable kinds are
/// transient and stay at `warn`.
fn failure_level(reason: FailureReason) -> Level {
    if reason.is_retryable() {
        Level::WARN
    } else {
        Level::ERROR
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::llm_client::testing::StubBackend;
    use crate::llm_client::GenerationDefaults;

    fn service_with(stub: Arc<StubBackend>) -> QuoteService {
        QuoteService::new(GenerationClient::new(stub, GenerationDefaults::default()))
    }

    fn request(category: &str, length: &str) -> GenerationRequest {
        GenerationRequest {
            category: Some(category.to_string()),
            length: Some(length.to_string()),
            ..GenerationRequest::default()
        }
    }

    #[tokio::test]
    async fn test_generate_quote_end_to_end() {
        let stub = Arc::new(StubBackend::replying(
            serde_json::json!({"text": "\"Keep going.\""}),
        ));
        let service = service_with(stub.clone());

        let quote = service
            .generate_quote(&request("motivation", "short"))
            .await
            .unwrap();

        assert_eq!(quote.quote, "Keep going.");
        assert_eq!(quote.category, "motivation");
        assert_eq!(quote.author, AUTHOR);
        assert!(quote.timestamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&quote.timestamp).is_ok());

        let prompts = stub.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("motivation"));
        assert!(prompts[0].contains("about 15 words"));
    }

    #[tokio::test]
    async fn test_invalid_length_never_reaches_backend() {
        let stub = Arc::new(StubBackend::replying(serde_json::json!({"text": "unused"})));
        let service = service_with(stub.clone());

        let err = service
            .generate_quote(&request("wisdom", "nonsense"))
            .await
            .unwrap_err();

        assert!(matches!(err, QuoteError::InvalidInput(PromptError::InvalidLength(_))));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_no_quote() {
        let stub = Arc::new(
            StubBackend::replying(serde_json::json!({"text": "Too late."}))
                .with_delay(Duration::from_secs(60)),
        );
        let service = service_with(stub);

        let result = service.generate_quote(&request("life", "medium")).await;

        match result {
            Err(QuoteError::Generation(e)) => assert_eq!(e.reason(), FailureReason::Timeout),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_random_quote_uses_random_category() {
        let stub = Arc::new(StubBackend::replying(serde_json::json!({"text": "Wander well."})));
        let service = service_with(stub.clone());

        let quote = service.random_quote().await.unwrap();

        assert_eq!(quote.category, "random");
        let prompts = stub.prompts();
        assert!(prompts[0].starts_with("Create an original quote on any theme"));
        assert!(prompts[0].contains("about 25 words"), "length defaults to medium");
    }

    #[tokio::test]
    async fn test_unknown_category_is_echoed_as_random() {
        let stub = Arc::new(StubBackend::replying(serde_json::json!({"text": "Grow slowly."})));
        let service = service_with(stub);

        let quote = service
            .generate_quote(&request("gardening", "long"))
            .await
            .unwrap();

        assert_eq!(quote.category, "random");
    }

    #[tokio::test]
    async fn test_request_overrides_reach_backend() {
        let stub = Arc::new(StubBackend::replying(serde_json::json!({"text": "Be brief."})));
        let service = service_with(stub.clone());
        let request = GenerationRequest {
            temperature: Some(0.1),
            max_tokens: Some(100),
            ..request("humor", "short")
        };

        service.generate_quote(&request).await.unwrap();

        let sent = stub.last_request().unwrap();
        assert_eq!(sent.generation_config.temperature, 0.1);
        assert_eq!(sent.generation_config.max_output_tokens, 100);
    }

    #[tokio::test]
    async fn test_content_block_surfaces_reason() {
        let stub = Arc::new(StubBackend::replying(serde_json::json!({
            "candidates": [{"finishReason": "SAFETY"}]
        })));
        let service = service_with(stub.clone());

        let err = service
            .generate_quote(&request("love", "short"))
            .await
            .unwrap_err();

        match err {
            QuoteError::Generation(e) => assert_eq!(e.reason(), FailureReason::ContentBlocked),
            other => panic!("expected content block, got {other:?}"),
        }
        assert_eq!(stub.calls(), 1, "blocked content is not retried");
    }

    #[test]
    fn test_failure_level_follows_retry_hint() {
        assert_eq!(failure_level(FailureReason::Timeout), Level::WARN);
        assert_eq!(failure_level(FailureReason::BackendUnavailable), Level::WARN);
        assert_eq!(failure_level(FailureReason::ContentBlocked), Level::ERROR);
        assert_eq!(failure_level(FailureReason::EmptyResponse), Level::ERROR);
    }
}
