// Slide layout engine: capacity model, paginator, image resolver, assembler.
// Pagination is pure and synchronous; the image resolver is the only
// concurrent subsystem.

pub mod assemble;
pub mod capacity;
pub mod images;
pub mod paginate;

// Re-export the public API consumed by handlers, state, and the renderer.
pub use assemble::assemble;
pub use capacity::{LayoutConfig, LayoutError, LevelStyle};
pub use images::{FetchLimits, ImageMode, ImageSearch, OpenverseImageSearch};
