//! Paginator — splits one logical slide into one or more physical slides.
//!
//! Greedy, order-preserving bin packing against the capacity model. Items
//! are never reordered, merged across slides, truncated, or split mid-text.
//! Pagination is pure computation and total for validated input.

use crate::layout::capacity::LayoutConfig;
use crate::models::deck::{ContentItem, LogicalSlide, PhysicalSlide};

/// Splits `slide` into at least one physical slide.
///
/// A new page opens whenever the next item would push the running cost past
/// `config.max_capacity()` and the current page already holds something. An
/// item whose own cost exceeds the budget still gets a page of its own. A
/// slide with no items yields exactly one heading-only page.
///
/// Pages after the first are marked `continuation` and never carry an image;
/// the assembler attaches the logical slide's image to page one only.
pub fn paginate(slide: &LogicalSlide, config: &LayoutConfig) -> Vec<PhysicalSlide> {
    let capacity = config.max_capacity();
    let mut pages: Vec<PhysicalSlide> = Vec::new();
    let mut current: Vec<ContentItem> = Vec::new();
    let mut running_cost = 0u32;

    for item in &slide.items {
        let cost = config.line_cost(item);
        if running_cost + cost > capacity && !current.is_empty() {
            let page = close_page(slide, std::mem::take(&mut current), pages.len());
            pages.push(page);
            running_cost = 0;
        }
        current.push(item.clone());
        running_cost += cost;
    }

    // Final buffer always closes, even when empty: a zero-item logical slide
    // still produces its heading-only page.
    if !current.is_empty() || pages.is_empty() {
        let page = close_page(slide, current, pages.len());
        pages.push(page);
    }

    pages
}

fn close_page(slide: &LogicalSlide, items: Vec<ContentItem>, page_index: usize) -> PhysicalSlide {
    PhysicalSlide {
        heading: slide.heading.clone(),
        items,
        continuation: page_index > 0,
        image: None,
    }
}
