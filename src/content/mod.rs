//! Content module - front-matter extraction, post records and compilation

mod components;
mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub(crate) use components::html_escape;
pub use components::CompileError;
pub use frontmatter::{parse_date, FrontMatter, FrontmatterError};
pub use markdown::MarkdownRenderer;
pub use post::{
    reading_time, sort_newest_first, Post, RecordError, DEFAULT_DESCRIPTION,
    DEFAULT_WORDS_PER_MINUTE,
};
