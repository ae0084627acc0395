//! Serves generated presentations for download.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue};
use tracing::debug;

use crate::errors::AppError;
use crate::state::AppState;

const PPTX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// GET /download/:filename
///
/// Filenames are generated by the deck handler; anything that is not a
/// plain `.pptx` basename is rejected before touching the filesystem.
pub async fn download_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<(HeaderMap, Vec<u8>), AppError> {
    if !is_safe_filename(&filename) {
        return Err(AppError::Validation("Invalid filename".to_string()));
    }

    let path = state.config.output_dir.join(&filename);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| AppError::NotFound(format!("No such presentation: {filename}")))?;

    debug!("serving {filename} ({} bytes)", bytes.len());

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(PPTX_MIME));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("bad header value: {e}")))?,
    );

    Ok((headers, bytes))
}

/// Plain basename ending in `.pptx`: no separators, no traversal, no
/// surprises in the Content-Disposition header.
fn is_safe_filename(name: &str) -> bool {
    name.ends_with(".pptx")
        && !name.contains(['/', '\\', '"'])
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
