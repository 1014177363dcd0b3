//! Blog post records as declared in the metadata file

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Path prefix every canonical post link starts with
pub const BLOG_PREFIX: &str = "/blog/";

/// Separator used inside content references
pub const REFERENCE_SEPARATOR: char = '-';

/// Accepts either a plain `YYYY-MM-DD` date or a full RFC 3339 timestamp
fn date_or_datetime<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Ok(datetime.date_naive());
    }
    if let Ok(datetime) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(datetime.date());
    }

    Err(D::Error::custom(format!("invalid publish date: {}", raw)))
}

/// A blog post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post title
    #[serde(alias = "Title")]
    pub title: String,

    /// Canonical path, `/blog/{year}/{month}/{slug}/`
    #[serde(alias = "Link")]
    pub link: String,

    /// Publication date
    #[serde(alias = "Date", deserialize_with = "date_or_datetime")]
    pub date: NaiveDate,

    /// Post categories
    #[serde(alias = "Categories", default)]
    pub categories: BTreeSet<String>,
}

impl Post {
    /// Create a new post without categories
    pub fn new(title: impl Into<String>, link: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            date,
            categories: BTreeSet::new(),
        }
    }

    /// Builder-style helper to attach categories
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Key used to locate and cache the post's Markdown source.
    ///
    /// `/blog/2021/0300/my-post/` becomes `2021-0300-my-post`. Links that do
    /// not start with `/blog/` are rejected when the index is loaded, so this
    /// only falls back to the whole link for hand-built posts.
    pub fn content_reference(&self) -> String {
        let rest = self.link.strip_prefix(BLOG_PREFIX).unwrap_or(&self.link);
        rest.trim_matches('/').replace('/', "-")
    }

    /// Whether the link has the canonical `/blog/{year}/{month}/{slug}/` shape.
    ///
    /// Exactly three non-empty segments, so the content reference always
    /// carries a separator and never names a simple page.
    pub fn has_canonical_link(&self) -> bool {
        let Some(rest) = self.link.strip_prefix(BLOG_PREFIX) else {
            return false;
        };
        let Some(rest) = rest.strip_suffix('/') else {
            return false;
        };
        let segments: Vec<&str> = rest.split('/').collect();
        segments.len() == 3 && segments.iter().all(|segment| !segment.is_empty())
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }
}
