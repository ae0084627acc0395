//! Image resolver — fetches one illustrative image per logical slide.
//!
//! All fetches for a deck run concurrently under a bounded permit pool, each
//! with its own timeout. A failed or timed-out fetch marks only its own
//! slide `Failed`; siblings and the deck itself are unaffected. Results are
//! keyed by logical-slide index, never by completion order, and no retry
//! happens inside a single resolve call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::models::deck::ImageRef;

/// How image resolution behaves for a deck run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// No network activity; every slot is `Skipped`.
    Disabled,
    /// Queries authored by the caller, forwarded verbatim.
    Manual,
    /// Queries authored by the content pipeline.
    Auto,
}

impl Default for ImageMode {
    fn default() -> Self {
        ImageMode::Manual
    }
}

/// Bounds on the concurrent fetch batch.
#[derive(Debug, Clone)]
pub struct FetchLimits {
    /// Maximum in-flight fetches. One task per logical slide, never per item.
    pub concurrency: usize,
    /// Per-fetch deadline; expiry converts that slide's result to `Failed`.
    pub timeout: Duration,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout: Duration::from_secs(10),
        }
    }
}

/// The external image-search collaborator.
///
/// Returns raw image bytes, `Ok(None)` for an explicit "nothing found", or
/// an error. The resolver treats errors, timeouts, and "nothing found"
/// identically as `Failed`.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn fetch(&self, query: &str, mode: ImageMode) -> anyhow::Result<Option<Bytes>>;
}

/// Resolves every `(slide_index, query)` request to an `ImageRef`.
///
/// The returned map holds exactly one entry per request. The caller joins on
/// the whole batch; nothing is merged before every task has finished.
pub async fn resolve_images(
    searcher: Arc<dyn ImageSearch>,
    requests: Vec<(usize, String)>,
    mode: ImageMode,
    limits: &FetchLimits,
) -> HashMap<usize, ImageRef> {
    let mut results: HashMap<usize, ImageRef> = HashMap::with_capacity(requests.len());

    if mode == ImageMode::Disabled {
        for (idx, query) in requests {
            results.insert(idx, ImageRef::skipped(query));
        }
        return results;
    }

    let permits = Arc::new(Semaphore::new(limits.concurrency.max(1)));
    let timeout = limits.timeout;
    let mut tasks: JoinSet<(usize, ImageRef)> = JoinSet::new();

    for (idx, query) in requests {
        let searcher = Arc::clone(&searcher);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            // Closed only if the set is aborted, which we never do.
            let _permit = match permits.acquire_owned().await {
                Ok(p) => p,
                Err(_) => return (idx, ImageRef::failed(query)),
            };

            let fetched = tokio::time::timeout(timeout, searcher.fetch(&query, mode)).await;
            let image = match fetched {
                Ok(Ok(Some(data))) => {
                    debug!("image resolved for slide {idx}: {} bytes", data.len());
                    ImageRef::resolved(query, data)
                }
                Ok(Ok(None)) => {
                    debug!("no image found for slide {idx}: {query:?}");
                    ImageRef::failed(query)
                }
                Ok(Err(e)) => {
                    warn!("image fetch failed for slide {idx}: {e:#}");
                    ImageRef::failed(query)
                }
                Err(_) => {
                    warn!("image fetch timed out for slide {idx} after {timeout:?}");
                    ImageRef::failed(query)
                }
            };
            (idx, image)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((idx, image)) => {
                results.insert(idx, image);
            }
            Err(e) => {
                // A panicked fetch task loses only its own slot; the slide
                // index is unrecoverable here, so the slot stays absent and
                // the assembler leaves that page without an image.
                warn!("image fetch task panicked: {e}");
            }
        }
    }

    results
}

// ────────────────────────────────────────────────────────────────────────────
// Openverse backend
// ────────────────────────────────────────────────────────────────────────────

const OPENVERSE_SEARCH_URL: &str = "https://api.openverse.org/v1/images/";

#[derive(Debug, Deserialize)]
struct OpenverseResponse {
    results: Vec<OpenverseResult>,
}

#[derive(Debug, Deserialize)]
struct OpenverseResult {
    url: String,
}

/// Default `ImageSearch` backend: query Openverse, download the first hit.
///
/// Manual and Auto are a pass-through policy decided upstream; the backend
/// issues the same single attempt for both.
pub struct OpenverseImageSearch {
    client: reqwest::Client,
}

impl OpenverseImageSearch {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("slidesmith/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("failed to build HTTP client"),
        }
    }
}

impl Default for OpenverseImageSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageSearch for OpenverseImageSearch {
    async fn fetch(&self, query: &str, _mode: ImageMode) -> anyhow::Result<Option<Bytes>> {
        let search: OpenverseResponse = self
            .client
            .get(OPENVERSE_SEARCH_URL)
            .query(&[("q", query), ("page_size", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(hit) = search.results.first() else {
            return Ok(None);
        };

        let bytes = self
            .client
            .get(&hit.url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        Ok(Some(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::deck::ImageStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted backend: fails for queries containing "bad", sleeps for
    /// queries containing "slow", resolves everything else.
    struct ScriptedSearch {
        calls: AtomicUsize,
    }

    impl ScriptedSearch {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ImageSearch for ScriptedSearch {
        async fn fetch(&self, query: &str, _mode: ImageMode) -> anyhow::Result<Option<Bytes>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if query.contains("bad") {
                anyhow::bail!("simulated upstream error");
            }
            if query.contains("slow") {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if query.contains("missing") {
                return Ok(None);
            }
            Ok(Some(Bytes::from(format!("img:{query}"))))
        }
    }

    fn requests(queries: &[&str]) -> Vec<(usize, String)> {
        queries
            .iter()
            .enumerate()
            .map(|(i, q)| (i, q.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_disabled_mode_skips_without_network() {
        let search = ScriptedSearch::new();
        let results = resolve_images(
            search.clone(),
            requests(&["cat", "dog"]),
            ImageMode::Disabled,
            &FetchLimits::default(),
        )
        .await;

        assert_eq!(results.len(), 2);
        assert!(results.values().all(|r| r.status == ImageStatus::Skipped));
        assert_eq!(search.calls.load(Ordering::SeqCst), 0, "no fetch may run");
    }

    #[tokio::test]
    async fn test_one_failure_does_not_affect_siblings() {
        let search = ScriptedSearch::new();
        let results = resolve_images(
            search,
            requests(&["cat", "bad dog", "bird", "fish", "tree"]),
            ImageMode::Auto,
            &FetchLimits::default(),
        )
        .await;

        assert_eq!(results.len(), 5);
        assert_eq!(results[&1].status, ImageStatus::Failed);
        assert!(results[&1].data.is_none());
        for idx in [0, 2, 3, 4] {
            assert_eq!(results[&idx].status, ImageStatus::Resolved, "slide {idx}");
            assert!(results[&idx].data.is_some());
        }
    }

    #[tokio::test]
    async fn test_results_keyed_by_slide_not_arrival_order() {
        let search = ScriptedSearch::new();
        let results = resolve_images(
            search,
            requests(&["alpha", "beta", "gamma"]),
            ImageMode::Manual,
            &FetchLimits {
                concurrency: 3,
                timeout: Duration::from_secs(5),
            },
        )
        .await;

        assert_eq!(results[&0].data.as_deref(), Some(b"img:alpha".as_ref()));
        assert_eq!(results[&1].data.as_deref(), Some(b"img:beta".as_ref()));
        assert_eq!(results[&2].data.as_deref(), Some(b"img:gamma".as_ref()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_only_the_slow_slide() {
        let search = ScriptedSearch::new();
        let results = resolve_images(
            search,
            requests(&["cat", "slow sloth", "dog"]),
            ImageMode::Auto,
            &FetchLimits {
                concurrency: 4,
                timeout: Duration::from_secs(2),
            },
        )
        .await;

        assert_eq!(results[&1].status, ImageStatus::Failed);
        assert_eq!(results[&0].status, ImageStatus::Resolved);
        assert_eq!(results[&2].status, ImageStatus::Resolved);
    }

    #[tokio::test]
    async fn test_not_found_maps_to_failed() {
        let search = ScriptedSearch::new();
        let results = resolve_images(
            search,
            requests(&["missing thing"]),
            ImageMode::Manual,
            &FetchLimits::default(),
        )
        .await;

        assert_eq!(results[&0].status, ImageStatus::Failed);
    }

    #[tokio::test]
    async fn test_concurrency_of_one_still_completes_batch() {
        let search = ScriptedSearch::new();
        let results = resolve_images(
            search.clone(),
            requests(&["a", "b", "c", "d"]),
            ImageMode::Auto,
            &FetchLimits {
                concurrency: 1,
                timeout: Duration::from_secs(5),
            },
        )
        .await;

        assert_eq!(results.len(), 4);
        assert_eq!(search.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_empty_request_set_returns_empty_map() {
        let search = ScriptedSearch::new();
        let results =
            resolve_images(search, vec![], ImageMode::Auto, &FetchLimits::default()).await;
        assert!(results.is_empty());
    }
}
