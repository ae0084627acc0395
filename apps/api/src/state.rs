use std::sync::Arc;

use crate::config::Config;
use crate::layout::{FetchLimits, ImageSearch, LayoutConfig};
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: LlmClient,
    pub config: Config,
    /// Validated capacity table driving pagination and render font sizes.
    pub layout: LayoutConfig,
    /// Pluggable image-search backend. Default: Openverse.
    pub image_search: Arc<dyn ImageSearch>,
    pub fetch_limits: FetchLimits,
}
