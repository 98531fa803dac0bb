//! Prompt composer: structured quote parameters → one compact generation prompt.
//!
//! Keep prompts short: elaborate prompts with examples come back as empty
//! MAX_TOKENS completions.

use thiserror::Error;
use tracing::warn;

use crate::llm_client::prompts::QUOTE_ONLY_INSTRUCTION;
use crate::quotes::models::{LengthClass, QuoteCategory, QuoteStyle};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("Invalid length '{0}': must be 'short', 'medium', or 'long'")]
    InvalidLength(String),
}

/// Builds the generation prompt.
///
/// Category and style never fail: unknown values fall back to `random` and
/// `modern`. An unknown length is rejected and no prompt is produced.
pub fn compose(
    category: Option<&str>,
    topic: Option<&str>,
    style: Option<&str>,
    length: &str,
) -> Result<String, PromptError> {
    let length: LengthClass = length.parse().map_err(PromptError::InvalidLength)?;

    let resolved = QuoteCategory::resolve(category);
    if let Some(raw) = category {
        if QuoteCategory::parse(raw).is_none() {
            warn!("Unknown category '{raw}', using '{resolved}'");
        }
    }

    let mut prompt = match resolved {
        QuoteCategory::Random => "Create an original quote on any theme".to_string(),
        other => format!("Create {} {other} quote", article(other.as_str())),
    };

    if let Some(topic) = topic.map(str::trim).filter(|t| !t.is_empty()) {
        prompt.push_str(&format!(" about {topic}"));
    }

    prompt.push_str(&format!(" in about {} words. ", length.target_words()));
    prompt.push_str(QuoteStyle::resolve(style).guidance());
    prompt.push(' ');
    prompt.push_str(QUOTE_ONLY_INSTRUCTION);

    Ok(prompt)
}

fn article(word: &str) -> &'static str {
    match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}
