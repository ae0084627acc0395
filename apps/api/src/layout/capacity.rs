//! Capacity model — declarative line-cost budget for a single slide body.
//!
//! This is an intentional approximation: no glyph metrics, no kerning. Each
//! nesting level declares a font size, a base line cost, and a wrap width in
//! characters. An item's cost is its base cost multiplied by the number of
//! wrapped lines its text needs at that level. The per-slide budget
//! (`max_capacity`) is the number of standard-height lines that fit the body
//! region at the configured font sizes.
//!
//! Keeping the whole model in one validated table makes the paginator
//! deterministic and testable without a rendering library, and turns the
//! "content is off-slide even though the item count looked fine" bug class
//! into a calibration problem on a single tunable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::deck::ContentItem;

/// Configuration-time failures. Fatal before any pagination begins.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("max_lines_per_slide must be positive")]
    ZeroCapacity,

    #[error("level style table must not be empty")]
    EmptyLevelTable,

    #[error("level {level} has a zero base line cost")]
    ZeroLineCost { level: usize },

    #[error("level {level} has a zero wrap width")]
    ZeroWrapWidth { level: usize },
}

/// Visual weight of one nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStyle {
    pub font_size_pt: u8,
    /// Line slots one wrapped line at this level consumes.
    pub base_line_cost: u32,
    /// Character count after which text wraps onto an additional line.
    pub wrap_chars: u32,
}

/// The full capacity table. Levels deeper than the table clamp to its last
/// entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub max_lines_per_slide: u32,
    pub levels: Vec<LevelStyle>,
}

impl Default for LayoutConfig {
    /// 16:9 body region under a 32pt heading: eight standard lines, with the
    /// classic 32/28/24pt ladder for levels 0/1/2.
    fn default() -> Self {
        Self {
            max_lines_per_slide: 8,
            levels: vec![
                LevelStyle {
                    font_size_pt: 32,
                    base_line_cost: 1,
                    wrap_chars: 60,
                },
                LevelStyle {
                    font_size_pt: 28,
                    base_line_cost: 1,
                    wrap_chars: 70,
                },
                LevelStyle {
                    font_size_pt: 24,
                    base_line_cost: 1,
                    wrap_chars: 80,
                },
            ],
        }
    }
}

impl LayoutConfig {
    /// Rejects unusable tables. Called once by the assembler before any
    /// slide is paginated.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.max_lines_per_slide == 0 {
            return Err(LayoutError::ZeroCapacity);
        }
        if self.levels.is_empty() {
            return Err(LayoutError::EmptyLevelTable);
        }
        for (level, style) in self.levels.iter().enumerate() {
            if style.base_line_cost == 0 {
                return Err(LayoutError::ZeroLineCost { level });
            }
            if style.wrap_chars == 0 {
                return Err(LayoutError::ZeroWrapWidth { level });
            }
        }
        Ok(())
    }

    /// Style for a nesting level, clamped to the deepest configured entry.
    pub fn style_for(&self, level: u8) -> &LevelStyle {
        let idx = (level as usize).min(self.levels.len() - 1);
        &self.levels[idx]
    }

    pub fn font_size_for(&self, level: u8) -> u8 {
        self.style_for(level).font_size_pt
    }

    /// Line slots `item` consumes: base cost times the number of wrapped
    /// lines its text needs. Empty text still costs one line.
    pub fn line_cost(&self, item: &ContentItem) -> u32 {
        let style = self.style_for(item.level);
        let chars = item.text.chars().count() as u32;
        let wrapped_lines = chars.div_ceil(style.wrap_chars).max(1);
        style.base_line_cost * wrapped_lines
    }

    /// The per-slide budget in line slots.
    pub fn max_capacity(&self) -> u32 {
        self.max_lines_per_slide
    }
}
