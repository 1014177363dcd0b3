//! Content module - blog index, pagination and Markdown rendering

mod index;
mod markdown;
pub mod pager;
mod post;
mod store;

pub use index::PostCollection;
pub use markdown::{MarkdownRenderer, DEFAULT_THEME as DEFAULT_HIGHLIGHT_THEME};
pub use pager::PageResult;
pub use post::Post;
pub use store::ContentStore;
