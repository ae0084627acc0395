//! Content generation pipeline: planner → writer → normalize.
//!
//! Three linear stages, mirroring how authors build a deck: plan the
//! outline, draft the per-slide content, then normalize the draft into the
//! validated shape the layout engine assumes. Each LLM stage has a
//! deterministic fallback for unrecoverable JSON, so a transport-level
//! success always yields usable content.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::extract::extract_typed;
use crate::generation::prompts::{
    IMAGE_FIELD_EXAMPLE, IMAGE_INSTRUCTION, PLANNER_PROMPT_TEMPLATE, PLANNER_SYSTEM,
    WRITER_PROMPT_TEMPLATE, WRITER_SYSTEM,
};
use crate::layout::ImageMode;
use crate::llm_client::LlmClient;
use crate::models::deck::{ContentItem, LogicalSlide};

const DEFAULT_NUM_SLIDES: u8 = 5;
const DEFAULT_TONE: &str = "professional";
const DEFAULT_AUDIENCE: &str = "general audience";

/// Request body for deck generation.
#[derive(Debug, Clone, Deserialize)]
pub struct DeckRequest {
    pub topic: String,
    #[serde(default)]
    pub include_images: bool,
    #[serde(default)]
    pub image_mode: ImageMode,
    #[serde(default)]
    pub num_slides: Option<u8>,
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub additional_instructions: Option<String>,
}

impl DeckRequest {
    pub fn num_slides(&self) -> u8 {
        self.num_slides.unwrap_or(DEFAULT_NUM_SLIDES).max(1)
    }

    fn tone(&self) -> &str {
        self.tone.as_deref().unwrap_or(DEFAULT_TONE)
    }

    fn audience(&self) -> &str {
        self.audience.as_deref().unwrap_or(DEFAULT_AUDIENCE)
    }

    /// The resolver mode actually in effect: `include_images = false` wins
    /// over any requested mode.
    pub fn effective_image_mode(&self) -> ImageMode {
        if self.include_images {
            self.image_mode
        } else {
            ImageMode::Disabled
        }
    }
}

/// Planner stage output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedOutline {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub outline: Vec<String>,
}

/// Writer stage output, before normalization. Tolerates the field drift
/// models produce: missing text, missing content, absent query.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftSlide {
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub content: Vec<DraftItem>,
    #[serde(default)]
    pub image_search_query: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftItem {
    pub text: Option<String>,
    #[serde(default)]
    pub level: u8,
}

/// Validated pipeline output, ready for the layout engine.
#[derive(Debug, Clone)]
pub struct PresentationContent {
    pub title: String,
    pub slides: Vec<LogicalSlide>,
}

/// Runs the full pipeline. `max_lines` is forwarded to the writer prompt so
/// drafted slides aim at the configured capacity up front; pagination still
/// enforces it afterwards.
pub async fn generate_content(
    llm: &LlmClient,
    request: &DeckRequest,
    max_lines: u32,
) -> Result<PresentationContent, AppError> {
    let planned = plan_outline(llm, request).await?;
    info!(
        "planned {} slides for topic {:?}",
        planned.outline.len(),
        request.topic
    );

    let drafts = write_slides(llm, request, &planned, max_lines).await?;
    let slides = normalize_slides(drafts, request.include_images);
    info!("writer produced {} usable slides", slides.len());

    Ok(PresentationContent {
        title: planned.title,
        slides,
    })
}

async fn plan_outline(llm: &LlmClient, request: &DeckRequest) -> Result<PlannedOutline, AppError> {
    let prompt = PLANNER_PROMPT_TEMPLATE
        .replace("{topic}", &request.topic)
        .replace("{audience}", request.audience())
        .replace("{tone}", request.tone())
        .replace(
            "{instructions}",
            request.additional_instructions.as_deref().unwrap_or(""),
        )
        .replace("{num_slides}", &request.num_slides().to_string());

    let text = llm
        .complete(&prompt, PLANNER_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("planner call failed: {e}")))?;

    let mut planned = match extract_typed::<PlannedOutline>(&text) {
        Some(planned) if !planned.outline.is_empty() => planned,
        _ => {
            warn!("planner output unrecoverable, using placeholder outline");
            fallback_outline(&request.topic, request.num_slides())
        }
    };
    if planned.title.trim().is_empty() {
        planned.title = request.topic.clone();
    }
    Ok(planned)
}

async fn write_slides(
    llm: &LlmClient,
    request: &DeckRequest,
    planned: &PlannedOutline,
    max_lines: u32,
) -> Result<Vec<DraftSlide>, AppError> {
    let outline_list = planned
        .outline
        .iter()
        .map(|h| format!("- {h}"))
        .collect::<Vec<_>>()
        .join("\n");

    let (image_instruction, image_field) = if request.include_images {
        (IMAGE_INSTRUCTION, IMAGE_FIELD_EXAMPLE)
    } else {
        ("", "")
    };

    let prompt = WRITER_PROMPT_TEMPLATE
        .replace("{title}", &planned.title)
        .replace("{audience}", request.audience())
        .replace("{tone}", request.tone())
        .replace("{outline}", &outline_list)
        .replace("{max_lines}", &max_lines.to_string())
        .replace("{image_field_example}", image_field)
        .replace("{image_instruction}", image_instruction);

    let text = llm
        .complete(&prompt, WRITER_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("writer call failed: {e}")))?;

    match extract_typed::<Vec<DraftSlide>>(&text) {
        Some(drafts) if !drafts.is_empty() => Ok(drafts),
        _ => {
            warn!("writer output unrecoverable, falling back to heading-only slides");
            Ok(planned
                .outline
                .iter()
                .map(|heading| DraftSlide {
                    heading: heading.clone(),
                    content: vec![],
                    image_search_query: None,
                })
                .collect())
        }
    }
}

/// Deterministic placeholder used when the planner's JSON is unrecoverable.
fn fallback_outline(topic: &str, num_slides: u8) -> PlannedOutline {
    PlannedOutline {
        title: topic.to_string(),
        outline: (1..=num_slides)
            .map(|i| format!("Slide {i} for {topic}"))
            .collect(),
    }
}

/// Converts writer drafts into the validated input the paginator assumes:
/// items without text are dropped, headings default to empty, and image
/// queries survive only when images were requested.
fn normalize_slides(drafts: Vec<DraftSlide>, include_images: bool) -> Vec<LogicalSlide> {
    drafts
        .into_iter()
        .map(|draft| {
            let items = draft
                .content
                .into_iter()
                .filter_map(|item| {
                    let text = item.text?;
                    if text.trim().is_empty() {
                        warn!("dropping content item with empty text");
                        return None;
                    }
                    Some(ContentItem {
                        text,
                        level: item.level,
                    })
                })
                .collect();

            LogicalSlide {
                heading: draft.heading,
                items,
                image_query: if include_images {
                    draft
                        .image_search_query
                        .filter(|q| !q.trim().is_empty())
                } else {
                    None
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(heading: &str, items: Vec<(Option<&str>, u8)>, query: Option<&str>) -> DraftSlide {
        DraftSlide {
            heading: heading.to_string(),
            content: items
                .into_iter()
                .map(|(text, level)| DraftItem {
                    text: text.map(str::to_string),
                    level,
                })
                .collect(),
            image_search_query: query.map(str::to_string),
        }
    }

    #[test]
    fn test_fallback_outline_is_deterministic() {
        let a = fallback_outline("Rust", 3);
        let b = fallback_outline("Rust", 3);
        assert_eq!(a.title, "Rust");
        assert_eq!(a.outline, b.outline);
        assert_eq!(
            a.outline,
            vec![
                "Slide 1 for Rust",
                "Slide 2 for Rust",
                "Slide 3 for Rust"
            ]
        );
    }

    #[test]
    fn test_normalize_drops_items_without_text() {
        let slides = normalize_slides(
            vec![draft(
                "Intro",
                vec![(Some("keep"), 0), (None, 1), (Some("   "), 0), (Some("also"), 2)],
                None,
            )],
            false,
        );

        assert_eq!(slides.len(), 1);
        let texts: Vec<&str> = slides[0].items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["keep", "also"]);
        assert_eq!(slides[0].items[1].level, 2);
    }

    #[test]
    fn test_normalize_strips_queries_when_images_off() {
        let slides = normalize_slides(
            vec![draft("A", vec![(Some("x"), 0)], Some("cat photo"))],
            false,
        );
        assert!(slides[0].image_query.is_none());
    }

    #[test]
    fn test_normalize_keeps_queries_when_images_on() {
        let slides = normalize_slides(
            vec![
                draft("A", vec![], Some("cat photo")),
                draft("B", vec![], Some("   ")),
                draft("C", vec![], None),
            ],
            true,
        );
        assert_eq!(slides[0].image_query.as_deref(), Some("cat photo"));
        assert!(slides[1].image_query.is_none());
        assert!(slides[2].image_query.is_none());
    }

    #[test]
    fn test_effective_image_mode_requires_include_flag() {
        let request: DeckRequest =
            serde_json::from_str(r#"{"topic": "Rust", "image_mode": "auto"}"#).unwrap();
        assert_eq!(request.effective_image_mode(), ImageMode::Disabled);

        let request: DeckRequest = serde_json::from_str(
            r#"{"topic": "Rust", "include_images": true, "image_mode": "auto"}"#,
        )
        .unwrap();
        assert_eq!(request.effective_image_mode(), ImageMode::Auto);
    }

    #[test]
    fn test_request_defaults() {
        let request: DeckRequest = serde_json::from_str(r#"{"topic": "Rust"}"#).unwrap();
        assert_eq!(request.num_slides(), 5);
        assert_eq!(request.tone(), "professional");
        assert_eq!(request.audience(), "general audience");
        assert_eq!(request.image_mode, ImageMode::Manual);
        assert!(!request.include_images);
    }
}
