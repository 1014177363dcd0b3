//! Site configuration (_config.yml)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::content::MarkdownRenderer;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,

    // Directory
    pub content_dir: String,
    pub static_dir: String,
    /// Blog metadata file, relative to `content_dir`
    pub metadata_file: String,

    // Blog
    pub per_page: usize,
    pub blog_section: String,
    /// Content identifier shown above the first archive page, if it exists
    pub blog_intro: String,

    // Rendering
    /// Keep rendered pages for the process lifetime. Turn off while editing.
    pub cache_content: bool,
    pub highlight_theme: String,

    // Simple pages
    pub pages: Vec<PageRoute>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "That Extra Mile".to_string(),

            content_dir: "content".to_string(),
            static_dir: "static".to_string(),
            metadata_file: "blog_metadata.json".to_string(),

            per_page: 5,
            blog_section: "Blog".to_string(),
            blog_intro: "blog_intro".to_string(),

            cache_content: true,
            highlight_theme: crate::content::DEFAULT_HIGHLIGHT_THEME.to_string(),

            pages: default_pages(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.per_page == 0 {
            bail!("per_page must be at least 1");
        }

        if !is_page_identifier(&self.blog_intro) {
            bail!(
                "blog_intro {:?} may not contain '-' or '/' (reserved for blog posts)",
                self.blog_intro
            );
        }

        let mut seen = HashSet::new();
        for page in &self.pages {
            if !page.path.starts_with('/') {
                bail!("page path {:?} must start with '/'", page.path);
            }
            if page.path == "/blog" || page.path.starts_with("/blog/") {
                bail!("page path {:?} collides with the blog routes", page.path);
            }
            if !is_page_identifier(&page.content) {
                bail!(
                    "page content {:?} may not contain '-' or '/' (reserved for blog posts)",
                    page.content
                );
            }
            if !seen.insert(page.path.as_str()) {
                bail!("page path {:?} is configured twice", page.path);
            }
        }

        Ok(())
    }

    /// Markdown renderer configured for this site
    pub fn markdown_renderer(&self) -> MarkdownRenderer {
        MarkdownRenderer::with_theme(&self.highlight_theme)
    }
}

/// Page identifiers resolve under the content root, never under `blog/`
fn is_page_identifier(identifier: &str) -> bool {
    !identifier.contains('-') && !identifier.contains('/')
}

/// A simple page mapped to a fixed path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRoute {
    pub path: String,
    /// Page title; empty means just the site title
    #[serde(default)]
    pub title: String,
    /// Navigation section to highlight
    pub section: String,
    /// Content identifier (`content/{content}.md`)
    pub content: String,
}

impl PageRoute {
    pub fn new(path: &str, title: &str, section: &str, content: &str) -> Self {
        Self {
            path: path.to_string(),
            title: title.to_string(),
            section: section.to_string(),
            content: content.to_string(),
        }
    }
}

fn default_pages() -> Vec<PageRoute> {
    vec![
        PageRoute::new("/", "", "Home", "home"),
        PageRoute::new("/contracting", "Contracting", "Contracting", "contracting"),
        PageRoute::new("/consulting", "Consulting", "Consulting", "consulting"),
        PageRoute::new("/training", "Training", "Training", "training"),
        PageRoute::new(
            "/training/nhibernate",
            "NHibernate Training",
            "Training",
            "nhibernate_training",
        ),
        PageRoute::new("/reviews", "Reviews", "Reviews", "reviews"),
    ]
}
