use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Where generated `.pptx` files land; created at startup if absent.
    pub output_dir: PathBuf,
    /// Per-slide line budget for the capacity model.
    pub max_lines_per_slide: u32,
    pub image_fetch_concurrency: usize,
    pub image_fetch_timeout_secs: u64,
    /// Generated decks older than this are swept.
    pub artifact_ttl_secs: u64,
    pub cleanup_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("generated")),
            max_lines_per_slide: parse_env("MAX_LINES_PER_SLIDE", 8)?,
            image_fetch_concurrency: parse_env("IMAGE_FETCH_CONCURRENCY", 4)?,
            image_fetch_timeout_secs: parse_env("IMAGE_FETCH_TIMEOUT_SECS", 10)?,
            artifact_ttl_secs: parse_env("ARTIFACT_TTL_SECS", 3600)?,
            cleanup_interval_secs: parse_env("CLEANUP_INTERVAL_SECS", 300)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("'{key}' must be a valid number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}
