//! Comparison reporting: counts, ranked price changes and a Markdown rendering.

pub mod render;
pub mod summary;

pub use render::render_human_summary;
pub use summary::{summarize, ComparisonSummary};
