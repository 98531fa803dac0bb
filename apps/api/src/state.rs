use std::sync::Arc;

use crate::quotes::service::QuoteService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Built once at startup. Holds the only backend client handle.
    pub quotes: Arc<QuoteService>,
}
