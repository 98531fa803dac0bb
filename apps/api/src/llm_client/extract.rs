//! Response extraction: turns one backend reply into clean quote text or a
//! classified failure.
//!
//! Order of checks:
//! 1. finish indicator on the primary candidate (blocks short-circuit, a length
//!    cutoff is remembered)
//! 2. extraction strategies in [`EXTRACTION_ORDER`], first non-empty wins
//! 3. empty classification (prompt block → truncated → empty)
//! 4. [`clean_quote`]

use tracing::{debug, warn};

use super::gemini::{FinishReason, GenerateContentResponse};
use super::LlmError;

/// Leading phrases models prepend despite being told not to. Matched verbatim.
const META_PREFIXES: &[&str] = &[
    "Here is your quote:",
    "Here's your quote:",
    "Here is a quote:",
    "Here's a quote:",
    "Here is the quote:",
    "Here's the quote:",
    "Sure! Here is your quote:",
    "Sure! Here's your quote:",
    "Sure, here is your quote:",
    "Sure, here's your quote:",
    "Quote:",
    "As an AI language model,",
    "As an AI,",
];

/// Headings that introduce a second-language rendition. Only honored at the
/// start of a later line or as a parenthetical closing out the text.
/// Matched case-insensitively.
const TRANSLATION_MARKERS: &[&str] = &["english translation:", "(translation", "translation:"];

const QUOTE_PAIRS: &[(char, char)] = &[('"', '"'), ('\'', '\''), ('“', '”'), ('‘', '’')];

/// Where text can live in a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Top-level `text` accessor.
    DirectText,
    /// All text-bearing parts of the primary candidate, joined by one space.
    CandidateParts,
    /// A `text` field set directly on the primary candidate.
    CandidateText,
}

pub const EXTRACTION_ORDER: [ExtractionStrategy; 3] = [
    ExtractionStrategy::DirectText,
    ExtractionStrategy::CandidateParts,
    ExtractionStrategy::CandidateText,
];

impl ExtractionStrategy {
    pub fn apply(self, response: &GenerateContentResponse) -> Option<String> {
        match self {
            ExtractionStrategy::DirectText => non_empty(response.text.as_deref()),
            ExtractionStrategy::CandidateParts => {
                let content = response.primary_candidate()?.content.as_ref()?;
                let joined = content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                non_empty(Some(&joined))
            }
            ExtractionStrategy::CandidateText => {
                non_empty(response.primary_candidate()?.text.as_deref())
            }
        }
    }
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Extracts and cleans the quote text from a backend reply.
pub fn extract_quote(response: &GenerateContentResponse) -> Result<String, LlmError> {
    let truncated = inspect_finish_reason(response)?;

    let raw = EXTRACTION_ORDER.iter().find_map(|strategy| {
        let text = strategy.apply(response)?;
        debug!("Extracted {} chars via {strategy:?}", text.len());
        Some(text)
    });

    let Some(raw) = raw else {
        return Err(classify_empty(response, truncated));
    };

    let cleaned = clean_quote(&raw);
    if cleaned.is_empty() {
        warn!("Quote is empty after cleanup (raw: {raw:?})");
        return Err(LlmError::EmptyResponse);
    }

    Ok(cleaned)
}

/// Returns `Ok(true)` when the candidate was cut off at the token limit.
fn inspect_finish_reason(response: &GenerateContentResponse) -> Result<bool, LlmError> {
    let finish_reason = response
        .primary_candidate()
        .and_then(|c| c.finish_reason);

    match finish_reason {
        None | Some(FinishReason::Stop) => Ok(false),
        Some(FinishReason::MaxTokens) => {
            warn!("MAX_TOKENS reached, output may be truncated");
            Ok(true)
        }
        Some(FinishReason::Safety) => Err(LlmError::ContentBlocked(
            "blocked by safety filters".to_string(),
        )),
        Some(FinishReason::Recitation) => Err(LlmError::ContentBlocked(
            "blocked for recitation of existing material".to_string(),
        )),
        Some(reason @ (FinishReason::Blocklist
        | FinishReason::ProhibitedContent
        | FinishReason::Spii)) => Err(LlmError::ContentBlocked(format!("{reason:?}"))),
        Some(FinishReason::FinishReasonUnspecified) => Err(LlmError::Unknown(
            "generation stopped without a finish reason".to_string(),
        )),
        Some(FinishReason::Other) => Err(LlmError::Unknown(
            "generation stopped with an unrecognized finish reason".to_string(),
        )),
    }
}

fn classify_empty(response: &GenerateContentResponse, truncated: bool) -> LlmError {
    if let Some(block_reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return LlmError::ContentBlocked(format!("prompt blocked: {block_reason}"));
    }

    if truncated {
        // An empty MAX_TOKENS completion is a safety cutoff in practice.
        LlmError::Truncated
    } else {
        LlmError::EmptyResponse
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Cleanup
// ────────────────────────────────────────────────────────────────────────────

/// Normalizes model output into bare quote text. Idempotent on clean input.
pub fn clean_quote(text: &str) -> String {
    let text = strip_meta_prefix(text.trim());
    let text = cut_before_translation(text);
    let text = strip_markdown_emphasis(text);
    strip_wrapping_quotes(text.trim()).trim().to_string()
}

fn strip_meta_prefix(text: &str) -> &str {
    META_PREFIXES
        .iter()
        .find_map(|prefix| text.strip_prefix(*prefix))
        .map(str::trim_start)
        .unwrap_or(text)
}

fn cut_before_translation(text: &str) -> &str {
    translation_heading(text)
        .or_else(|| trailing_translation_note(text))
        .map(|idx| text[..idx].trim_end())
        .unwrap_or(text)
}

/// Byte offset of the first line after the opening one that starts with a
/// translation marker.
fn translation_heading(text: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        if start == 0 {
            continue;
        }
        let lowered = line.trim_start().to_ascii_lowercase();
        if TRANSLATION_MARKERS.iter().any(|m| lowered.starts_with(*m)) {
            return Some(start);
        }
    }
    None
}

/// Byte offset of a `(translation ...)` note whose closing paren ends the text.
fn trailing_translation_note(text: &str) -> Option<usize> {
    let trimmed = text.trim_end();
    if !trimmed.ends_with(')') {
        return None;
    }
    // ASCII lowercasing keeps byte offsets aligned with `trimmed`.
    let idx = trimmed.to_ascii_lowercase().rfind("(translation")?;
    let close = idx + trimmed[idx..].find(')')?;
    (idx > 0 && close == trimmed.len() - 1).then_some(idx)
}

fn strip_markdown_emphasis(text: &str) -> String {
    text.replace("__", "")
        .chars()
        .filter(|c| !matches!(c, '*' | '`'))
        .collect()
}

/// Removes exactly one layer of matching wrapping quotes.
fn strip_wrapping_quotes(text: &str) -> &str {
    for &(open, close) in QUOTE_PAIRS {
        if text.len() >= open.len_utf8() + close.len_utf8()
            && text.starts_with(open)
            && text.ends_with(close)
        {
            return &text[open.len_utf8()..text.len() - close.len_utf8()];
        }
    }
    text
}
