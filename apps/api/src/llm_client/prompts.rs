// Shared prompt fragments.
// Feature prompts live next to the code that composes them (see quotes/prompts.rs).
// Keep these terse: long instructions make the backend's safety cutoff more likely.

/// Closing instruction on every generation prompt.
pub const QUOTE_ONLY_INSTRUCTION: &str =
    "Reply with only the quote text, without attribution, quotation marks, or commentary.";
