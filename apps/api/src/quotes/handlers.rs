//! Axum route handlers for the Quotes API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::quotes::models::{
    GeneratedQuote, GenerationRequest, QuoteCategory, MAX_OUTPUT_TOKENS, MAX_STYLE_CHARS,
    MAX_TOPIC_CHARS,
};
use crate::state::AppState;

/// POST /api/quotes/generate
///
/// Generates one quote from the requested category, topic, style and length.
pub async fn handle_generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GeneratedQuote>, AppError> {
    let Json(request) = payload?;
    validate_request(&request)?;

    info!(
        "Quote request: category={:?}, length={:?}, style={:?}",
        request.category, request.length, request.style
    );

    let quote = state.quotes.generate_quote(&request).await?;

    Ok(Json(quote))
}

/// GET /api/quotes/random
pub async fn handle_random(State(state): State<AppState>) -> Result<Json<GeneratedQuote>, AppError> {
    let quote = state.quotes.random_quote().await?;
    Ok(Json(quote))
}

/// GET /api/quotes/categories
pub async fn handle_categories() -> Json<Vec<&'static str>> {
    Json(QuoteCategory::ALL.iter().map(|c| c.as_str()).collect())
}

/// Bounds checks on caller-supplied fields. Length is checked by the prompt
/// composer, category and style are normalized there.
fn validate_request(request: &GenerationRequest) -> Result<(), AppError> {
    if let Some(topic) = &request.topic {
        if topic.chars().count() > MAX_TOPIC_CHARS {
            return Err(AppError::Validation(format!(
                "topic must be at most {MAX_TOPIC_CHARS} characters"
            )));
        }
    }

    if let Some(style) = &request.style {
        if style.chars().count() > MAX_STYLE_CHARS {
            return Err(AppError::Validation(format!(
                "style must be at most {MAX_STYLE_CHARS} characters"
            )));
        }
    }

    if let Some(temperature) = request.temperature {
        if !(0.0..=1.0).contains(&temperature) {
            return Err(AppError::Validation(
                "temperature must be between 0.0 and 1.0".to_string(),
            ));
        }
    }

    if let Some(max_tokens) = request.max_tokens {
        if max_tokens == 0 || max_tokens > MAX_OUTPUT_TOKENS {
            return Err(AppError::Validation(format!(
                "max_tokens must be between 1 and {MAX_OUTPUT_TOKENS}"
            )));
        }
    }

    Ok(())
}
