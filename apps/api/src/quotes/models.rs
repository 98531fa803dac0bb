use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Attribution stamped on every generated quote.
pub const AUTHOR: &str = "Ayō";

pub const MAX_TOPIC_CHARS: usize = 100;
pub const MAX_STYLE_CHARS: usize = 50;
pub const MAX_OUTPUT_TOKENS: u32 = 8192;

// ────────────────────────────────────────────────────────────────────────────
// Category
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteCategory {
    Motivation,
    Inspiration,
    Wisdom,
    Humor,
    Love,
    Success,
    Life,
    Friendship,
    Happiness,
    Random,
}

impl QuoteCategory {
    /// Every category in the order the categories endpoint lists them.
    pub const ALL: [QuoteCategory; 10] = [
        QuoteCategory::Motivation,
        QuoteCategory::Inspiration,
        QuoteCategory::Wisdom,
        QuoteCategory::Humor,
        QuoteCategory::Love,
        QuoteCategory::Success,
        QuoteCategory::Life,
        QuoteCategory::Friendship,
        QuoteCategory::Happiness,
        QuoteCategory::Random,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuoteCategory::Motivation => "motivation",
            QuoteCategory::Inspiration => "inspiration",
            QuoteCategory::Wisdom => "wisdom",
            QuoteCategory::Humor => "humor",
            QuoteCategory::Love => "love",
            QuoteCategory::Success => "success",
            QuoteCategory::Life => "life",
            QuoteCategory::Friendship => "friendship",
            QuoteCategory::Happiness => "happiness",
            QuoteCategory::Random => "random",
        }
    }

    /// Exact (case-insensitive) lookup. `None` for anything outside the set.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw))
    }

    /// Total resolution: absent or unknown values become `Random`.
    pub fn resolve(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or(QuoteCategory::Random)
    }
}

impl fmt::Display for QuoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Length
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthClass {
    Short,
    #[default]
    Medium,
    Long,
}

impl LengthClass {
    pub fn as_str(self) -> &'static str {
        match self {
            LengthClass::Short => "short",
            LengthClass::Medium => "medium",
            LengthClass::Long => "long",
        }
    }

    pub fn target_words(self) -> u32 {
        match self {
            LengthClass::Short => 15,
            LengthClass::Medium => 25,
            LengthClass::Long => 45,
        }
    }
}

impl FromStr for LengthClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(LengthClass::Short),
            "medium" => Ok(LengthClass::Medium),
            "long" => Ok(LengthClass::Long),
            _ => Err(s.to_string()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Style
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteStyle {
    Shakespearean,
    #[default]
    Modern,
    Philosophical,
    Poetic,
    Witty,
}

impl QuoteStyle {
    /// Total, case-insensitive resolution with `Modern` as the default branch.
    pub fn resolve(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("shakespearean") => QuoteStyle::Shakespearean,
            Some("philosophical") => QuoteStyle::Philosophical,
            Some("poetic") => QuoteStyle::Poetic,
            Some("witty") => QuoteStyle::Witty,
            _ => QuoteStyle::Modern,
        }
    }

    /// One-sentence tone instruction for the prompt.
    pub fn guidance(self) -> &'static str {
        match self {
            QuoteStyle::Shakespearean => "Use Elizabethan English with dramatic flair.",
            QuoteStyle::Modern => "Use clear, contemporary language.",
            QuoteStyle::Philosophical => "Use deep, reflective language.",
            QuoteStyle::Poetic => "Use vivid imagery and rhythmic language.",
            QuoteStyle::Witty => "Use clever, playful language.",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Request / result records
// ────────────────────────────────────────────────────────────────────────────

/// Caller-supplied description of the quote to generate.
///
/// `category` and `style` are free-text-like and normalized by the prompt
/// composer. `length` is structured and rejected when unknown.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    pub category: Option<String>,
    pub topic: Option<String>,
    pub style: Option<String>,
    pub length: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    /// Request with every field defaulted; category resolves to `Random`.
    pub fn random() -> Self {
        Self {
            category: Some(QuoteCategory::Random.as_str().to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedQuote {
    pub quote: String,
    pub author: String,
    pub category: String,
    pub timestamp: String,
}
