//! Archive pagination

use std::sync::Arc;

use super::Post;
use crate::error::{Result, SiteError};

/// One page of an archive listing
#[derive(Debug, Clone)]
pub struct PageResult {
    pub posts: Vec<Arc<Post>>,
    pub page: usize,
    pub previous_page: Option<usize>,
    pub next_page: Option<usize>,
}

/// Slice `posts` into a page of at most `page_size` entries.
///
/// Pages are 1-based. A page past the end is empty rather than an error.
/// There is a next page whenever this one is full, which means a listing
/// that divides evenly ends with an empty page.
pub fn paginate(posts: &[Arc<Post>], page: usize, page_size: usize) -> Result<PageResult> {
    if page == 0 {
        return Err(SiteError::invalid_argument("page number must be at least 1"));
    }
    if page_size == 0 {
        return Err(SiteError::invalid_argument("page size must be at least 1"));
    }

    let offset = (page - 1).saturating_mul(page_size);
    let page_posts: Vec<_> = posts.iter().skip(offset).take(page_size).cloned().collect();

    let previous_page = if page == 1 { None } else { Some(page - 1) };
    let next_page = if page_posts.len() < page_size {
        None
    } else {
        Some(page + 1)
    };

    Ok(PageResult {
        posts: page_posts,
        page,
        previous_page,
        next_page,
    })
}

/// Posts carrying `category`, relative order preserved
pub fn filter_by_category(posts: &[Arc<Post>], category: &str) -> Vec<Arc<Post>> {
    posts
        .iter()
        .filter(|post| post.has_category(category))
        .cloned()
        .collect()
}

/// Filter by category, then paginate
pub fn paginate_category(
    posts: &[Arc<Post>],
    category: &str,
    page: usize,
    page_size: usize,
) -> Result<PageResult> {
    paginate(&filter_by_category(posts, category), page, page_size)
}
