//! Blog index - post metadata loaded once at startup

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::Post;
use crate::error::{Result, SiteError};

/// All blog posts, in the order the metadata file declares them.
///
/// Built once and never mutated, so handlers read it without locking.
/// The declared order is kept as-is: it is not re-sorted by date, and the
/// newest-first listing is a literal reversal of it.
#[derive(Debug, Clone, Default)]
pub struct PostCollection {
    oldest_first: Vec<Arc<Post>>,
    newest_first: Vec<Arc<Post>>,
    /// Link -> position in `oldest_first`
    by_link: HashMap<String, usize>,
}

impl PostCollection {
    /// Load the collection from a JSON metadata file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| SiteError::data(path, format!("cannot read metadata: {}", e)))?;
        let posts: Vec<Post> = serde_json::from_str(&content)
            .map_err(|e| SiteError::data(path, format!("malformed metadata: {}", e)))?;

        let collection = Self::build(posts).map_err(|message| SiteError::data(path, message))?;
        tracing::info!("Loaded {} blog posts from {:?}", collection.len(), path);
        Ok(collection)
    }

    /// Build a collection from posts that are already in memory
    pub fn from_posts(posts: Vec<Post>) -> Result<Self> {
        Self::build(posts).map_err(|message| SiteError::data("<memory>", message))
    }

    fn build(posts: Vec<Post>) -> std::result::Result<Self, String> {
        let mut by_link = HashMap::with_capacity(posts.len());
        let mut oldest_first = Vec::with_capacity(posts.len());

        for (position, post) in posts.into_iter().enumerate() {
            if !post.has_canonical_link() {
                return Err(format!(
                    "post {:?} has link {:?}, expected /blog/{{year}}/{{month}}/{{slug}}/",
                    post.title, post.link
                ));
            }
            if by_link.insert(post.link.clone(), position).is_some() {
                return Err(format!("duplicate link {:?}", post.link));
            }
            oldest_first.push(Arc::new(post));
        }

        let newest_first = oldest_first.iter().rev().cloned().collect();

        Ok(Self {
            oldest_first,
            newest_first,
            by_link,
        })
    }

    pub fn len(&self) -> usize {
        self.oldest_first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oldest_first.is_empty()
    }

    /// Posts in declared order
    pub fn oldest_first(&self) -> &[Arc<Post>] {
        &self.oldest_first
    }

    /// Posts in reversed declared order, used for archive listings
    pub fn newest_first(&self) -> &[Arc<Post>] {
        &self.newest_first
    }

    /// Find a post by its canonical link
    pub fn lookup_by_link(&self, link: &str) -> Result<&Arc<Post>> {
        self.by_link
            .get(link)
            .map(|&position| &self.oldest_first[position])
            .ok_or_else(|| SiteError::not_found(format!("post {}", link)))
    }

    /// Find a post by the `/blog/{year}/{month}/{slug}/` route parts
    pub fn lookup(&self, year: &str, month: &str, slug: &str) -> Result<&Arc<Post>> {
        self.lookup_by_link(&format!("/blog/{}/{}/{}/", year, month, slug))
    }

    /// Previous and next posts in declared order.
    ///
    /// The first post has no previous, the last has no next. A post that is
    /// not part of this collection has neither.
    pub fn neighbors(&self, post: &Post) -> (Option<&Arc<Post>>, Option<&Arc<Post>>) {
        let Some(&position) = self.by_link.get(&post.link) else {
            return (None, None);
        };

        let previous = position
            .checked_sub(1)
            .and_then(|i| self.oldest_first.get(i));
        let next = self.oldest_first.get(position + 1);
        (previous, next)
    }

    /// Category names with their post counts, sorted by name
    pub fn categories(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for post in &self.oldest_first {
            for category in &post.categories {
                *counts.entry(category.as_str()).or_insert(0) += 1;
            }
        }

        let mut categories: Vec<_> = counts
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        categories.sort();
        categories
    }
}
