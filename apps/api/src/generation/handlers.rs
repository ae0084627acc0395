//! HTTP handler for deck generation.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::pipeline::{generate_content, DeckRequest};
use crate::layout::assemble;
use crate::render::write_pptx;
use crate::state::AppState;

/// Response for a successfully generated deck.
#[derive(Debug, Clone, Serialize)]
pub struct DeckResponse {
    pub message: String,
    pub deck_id: Uuid,
    pub download_url: String,
    pub slide_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// POST /api/v1/decks
///
/// Topic in, download URL out: pipeline → assembler → PPTX on disk. The
/// renderer runs in `spawn_blocking`; it is file I/O plus zip compression.
pub async fn handle_create_deck(
    State(state): State<AppState>,
    Json(request): Json<DeckRequest>,
) -> Result<Json<DeckResponse>, AppError> {
    if request.topic.trim().is_empty() {
        return Err(AppError::Validation("Topic is required".to_string()));
    }

    info!(
        "generating deck for topic {:?} (images: {:?})",
        request.topic,
        request.effective_image_mode()
    );

    let content = generate_content(&state.llm, &request, state.layout.max_capacity()).await?;

    let deck = assemble(
        &content.title,
        &content.slides,
        request.effective_image_mode(),
        &state.layout,
        state.image_search.clone(),
        &state.fetch_limits,
    )
    .await?;

    let deck_id = Uuid::new_v4();
    let filename = format!("presentation_{deck_id}.pptx");
    let path = state.config.output_dir.join(&filename);
    let slide_count = deck.slides.len();

    let layout = state.layout.clone();
    tokio::task::spawn_blocking(move || write_pptx(&deck, &layout, &path))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("render task failed: {e}")))??;

    info!("deck {deck_id} written ({slide_count} slides)");

    Ok(Json(DeckResponse {
        message: "Presentation created successfully".to_string(),
        deck_id,
        download_url: format!("/download/{filename}"),
        slide_count,
        generated_at: Utc::now(),
    }))
}
