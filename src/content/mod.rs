//! Content module - post models and rich text

mod post;
mod rich_text;

pub use post::{Banner, ContentGroup, Post, PostSummary};
pub use rich_text::{Block, BlockKind, RichText, Span, SpanKind};
