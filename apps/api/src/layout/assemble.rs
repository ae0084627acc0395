//! Layout assembler — turns validated content into the final deck.
//!
//! One concurrent image-resolution batch for the whole deck, then one
//! (cheap, sequential) pagination pass per logical slide. The resolved
//! image lands on the first physical page of its originating logical slide;
//! continuation pages never carry one. Output slide order is input order,
//! independent of fetch completion order.

use std::sync::Arc;

use tracing::info;

use crate::layout::capacity::{LayoutConfig, LayoutError};
use crate::layout::images::{resolve_images, FetchLimits, ImageMode, ImageSearch};
use crate::layout::paginate::paginate;
use crate::models::deck::{Deck, LogicalSlide};

/// Builds the deck for `logical_slides`.
///
/// Fails only on a misconfigured capacity table, before any pagination. A
/// deck with some `Failed` or `Skipped` images is a valid, complete result;
/// image trouble never aborts assembly.
pub async fn assemble(
    title: &str,
    logical_slides: &[LogicalSlide],
    mode: ImageMode,
    config: &LayoutConfig,
    searcher: Arc<dyn ImageSearch>,
    limits: &FetchLimits,
) -> Result<Deck, LayoutError> {
    config.validate()?;

    let requests: Vec<(usize, String)> = logical_slides
        .iter()
        .enumerate()
        .filter_map(|(idx, slide)| {
            slide
                .image_query
                .as_deref()
                .filter(|q| !q.trim().is_empty())
                .map(|q| (idx, q.to_string()))
        })
        .collect();

    let mut images = if requests.is_empty() {
        Default::default()
    } else {
        resolve_images(searcher, requests, mode, limits).await
    };

    let mut slides = Vec::new();
    for (idx, logical) in logical_slides.iter().enumerate() {
        let mut pages = paginate(logical, config);
        if let Some(image) = images.remove(&idx) {
            // Only page one of a logical slide is image-eligible.
            pages[0].image = Some(image);
        }
        slides.append(&mut pages);
    }

    info!(
        "assembled deck {title:?}: {} logical slides -> {} physical slides",
        logical_slides.len(),
        slides.len()
    );

    Ok(Deck {
        title: title.to_string(),
        slides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::capacity::LayoutConfig;
    use crate::models::deck::{ContentItem, ImageStatus};
    use async_trait::async_trait;
    use bytes::Bytes;

    struct FlakySearch;

    #[async_trait]
    impl ImageSearch for FlakySearch {
        async fn fetch(&self, query: &str, _mode: ImageMode) -> anyhow::Result<Option<Bytes>> {
            if query.contains("bad") {
                anyhow::bail!("boom");
            }
            Ok(Some(Bytes::from(format!("img:{query}"))))
        }
    }

    fn logical(heading: &str, n_items: usize, query: Option<&str>) -> LogicalSlide {
        LogicalSlide {
            heading: heading.to_string(),
            items: (0..n_items)
                .map(|i| ContentItem {
                    text: format!("Item {}", i + 1),
                    level: 0,
                })
                .collect(),
            image_query: query.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_overflowing_slide_gets_image_on_first_page_only() {
        let deck = assemble(
            "Pagination Test",
            &[logical("Overflowing Slide", 20, Some("test"))],
            ImageMode::Manual,
            &LayoutConfig::default(),
            Arc::new(FlakySearch),
            &FetchLimits::default(),
        )
        .await
        .unwrap();

        assert_eq!(deck.slides.len(), 3);
        assert!(deck.slides[0].image.is_some());
        assert!(deck.slides[1].image.is_none());
        assert!(deck.slides[2].image.is_none());
        assert!(deck.slides[1].continuation);
    }

    #[tokio::test]
    async fn test_failed_image_leaves_deck_complete_and_ordered() {
        let slides = vec![
            logical("One", 2, Some("cat")),
            logical("Two", 2, Some("bad dog")),
            logical("Three", 2, Some("bird")),
        ];
        let deck = assemble(
            "Isolation",
            &slides,
            ImageMode::Auto,
            &LayoutConfig::default(),
            Arc::new(FlakySearch),
            &FetchLimits::default(),
        )
        .await
        .unwrap();

        let headings: Vec<&str> = deck.slides.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["One", "Two", "Three"]);

        let statuses: Vec<ImageStatus> = deck
            .slides
            .iter()
            .map(|s| s.image.as_ref().unwrap().status)
            .collect();
        assert_eq!(
            statuses,
            vec![ImageStatus::Resolved, ImageStatus::Failed, ImageStatus::Resolved]
        );
    }

    #[tokio::test]
    async fn test_disabled_mode_attaches_skipped_refs() {
        let deck = assemble(
            "No Images",
            &[logical("A", 1, Some("cat"))],
            ImageMode::Disabled,
            &LayoutConfig::default(),
            Arc::new(FlakySearch),
            &FetchLimits::default(),
        )
        .await
        .unwrap();

        let image = deck.slides[0].image.as_ref().unwrap();
        assert_eq!(image.status, ImageStatus::Skipped);
        assert!(image.data.is_none());
    }

    #[tokio::test]
    async fn test_slides_without_queries_request_nothing() {
        let deck = assemble(
            "Plain",
            &[logical("A", 1, None), logical("B", 0, Some("  "))],
            ImageMode::Auto,
            &LayoutConfig::default(),
            Arc::new(FlakySearch),
            &FetchLimits::default(),
        )
        .await
        .unwrap();

        assert_eq!(deck.slides.len(), 2);
        assert!(deck.slides.iter().all(|s| s.image.is_none()));
    }

    #[tokio::test]
    async fn test_misconfigured_capacity_fails_fast() {
        let config = LayoutConfig {
            max_lines_per_slide: 0,
            ..LayoutConfig::default()
        };
        let err = assemble(
            "Broken",
            &[logical("A", 3, None)],
            ImageMode::Disabled,
            &config,
            Arc::new(FlakySearch),
            &FetchLimits::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err, LayoutError::ZeroCapacity);
    }

    #[tokio::test]
    async fn test_empty_deck_is_valid() {
        let deck = assemble(
            "Empty",
            &[],
            ImageMode::Auto,
            &LayoutConfig::default(),
            Arc::new(FlakySearch),
            &FetchLimits::default(),
        )
        .await
        .unwrap();

        assert_eq!(deck.title, "Empty");
        assert!(deck.slides.is_empty());
    }
}
