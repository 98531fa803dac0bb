// Quote generation: prompt composition, generation orchestration, HTTP handlers.
// All backend calls go through llm_client. Nothing here talks to Gemini directly.

pub mod handlers;
pub mod models;
pub mod prompts;
pub mod service;
