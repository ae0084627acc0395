pub mod download;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/decks", post(handlers::handle_create_deck))
        .route("/download/:filename", get(download::download_handler))
        .with_state(state)
}
