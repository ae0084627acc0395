//! Core deck data model shared by the generation pipeline, the layout
//! engine, and the renderer.
//!
//! A `LogicalSlide` is one author-intended slide as produced by the content
//! pipeline. Pagination may split it into several `PhysicalSlide`s; the
//! split never reorders or merges items, and only the first physical page
//! of a logical slide may carry an image.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// One bullet of slide content at a given nesting depth.
///
/// `level` 0 is a top-level point, 1 a sub-point, 2 a detail, and so on.
/// Items are immutable once the pipeline has normalized them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub text: String,
    #[serde(default)]
    pub level: u8,
}

/// One intended slide before pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalSlide {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub items: Vec<ContentItem>,
    /// Search query for an illustrative image, if the caller asked for one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_query: Option<String>,
}

/// Outcome of a single image resolution attempt. Never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    Resolved,
    Failed,
    Skipped,
}

/// An image slot attached to the first physical page of a logical slide.
///
/// Created when resolution is requested, finalized exactly once when the
/// fetch completes, errors, or times out.
#[derive(Debug, Clone)]
pub struct ImageRef {
    pub query: String,
    pub data: Option<Bytes>,
    pub status: ImageStatus,
}

impl ImageRef {
    pub fn skipped(query: String) -> Self {
        Self {
            query,
            data: None,
            status: ImageStatus::Skipped,
        }
    }

    pub fn failed(query: String) -> Self {
        Self {
            query,
            data: None,
            status: ImageStatus::Failed,
        }
    }

    pub fn resolved(query: String, data: Bytes) -> Self {
        Self {
            query,
            data: Some(data),
            status: ImageStatus::Resolved,
        }
    }
}

/// One actually rendered slide after pagination.
///
/// `continuation` is true for pages 2..N of an overflowing logical slide.
#[derive(Debug, Clone)]
pub struct PhysicalSlide {
    pub heading: String,
    pub items: Vec<ContentItem>,
    pub continuation: bool,
    pub image: Option<ImageRef>,
}

/// The assembler's sole output, handed to the renderer.
#[derive(Debug, Clone)]
pub struct Deck {
    pub title: String,
    pub slides: Vec<PhysicalSlide>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_item_level_defaults_to_zero() {
        let item: ContentItem = serde_json::from_str(r#"{"text": "Main point"}"#).unwrap();
        assert_eq!(item.level, 0);
        assert_eq!(item.text, "Main point");
    }

    #[test]
    fn test_logical_slide_tolerates_missing_fields() {
        let slide: LogicalSlide = serde_json::from_str(r#"{"heading": "Intro"}"#).unwrap();
        assert_eq!(slide.heading, "Intro");
        assert!(slide.items.is_empty());
        assert!(slide.image_query.is_none());
    }

    #[test]
    fn test_image_ref_constructors_set_status() {
        assert_eq!(ImageRef::skipped("q".into()).status, ImageStatus::Skipped);
        assert_eq!(ImageRef::failed("q".into()).status, ImageStatus::Failed);
        let resolved = ImageRef::resolved("q".into(), Bytes::from_static(b"\xff\xd8"));
        assert_eq!(resolved.status, ImageStatus::Resolved);
        assert!(resolved.data.is_some());
    }
}
