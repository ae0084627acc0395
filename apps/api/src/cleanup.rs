//! Background sweep of generated presentation files.
//!
//! Decks are one-shot downloads; anything older than the configured TTL in
//! the output directory gets removed on a fixed interval. Only `.pptx`
//! files are touched.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

pub fn spawn_sweeper(dir: PathBuf, ttl: Duration, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match sweep_once(&dir, ttl) {
                Ok(0) => {}
                Ok(n) => info!("cleanup removed {n} expired presentation(s)"),
                Err(e) => warn!("cleanup sweep failed: {e}"),
            }
        }
    })
}

/// Removes expired `.pptx` files under `dir`; returns how many went away.
fn sweep_once(dir: &Path, ttl: Duration) -> std::io::Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("pptx") {
            continue;
        }
        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };
        let expired = modified
            .elapsed()
            .map(|age| age > ttl)
            .unwrap_or(false);
        if expired {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!("failed to remove {}: {e}", path.display()),
            }
        }
    }
    Ok(removed)
}
