pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::quotes::handlers;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/quotes/generate", post(handlers::handle_generate))
        .route("/api/quotes/random", get(handlers::handle_random))
        .route("/api/quotes/categories", get(handlers::handle_categories))
        .fallback(not_found)
        .with_state(state)
}
