//! extramile: server for a small business website with a Markdown blog
//!
//! Pages and blog posts are Markdown files rendered on first request and
//! kept in memory. Blog metadata is read once at startup from a JSON file
//! and drives post lookup, previous/next navigation and the paginated
//! archive.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// A site on disk
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Markdown content root
    pub content_dir: PathBuf,
    /// Static assets served as-is
    pub static_dir: PathBuf,
}

impl Site {
    /// Open a site directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            tracing::debug!("Loading config from {:?}", config_path);
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let content_dir = base_dir.join(&config.content_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Ok(Self {
            config,
            base_dir,
            content_dir,
            static_dir,
        })
    }

    /// Location of the blog metadata file
    pub fn metadata_path(&self) -> PathBuf {
        self.content_dir.join(&self.config.metadata_file)
    }

    /// Serve the site
    pub async fn serve(&self, ip: &str, port: u16) -> Result<()> {
        server::start(self, ip, port).await
    }

    /// Verify that metadata and content files are consistent
    pub fn check(&self) -> Result<commands::check::Report> {
        commands::check::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_site_defaults() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.content_dir, dir.path().join("content"));
        assert_eq!(site.static_dir, dir.path().join("static"));
        assert_eq!(
            site.metadata_path(),
            dir.path().join("content").join("blog_metadata.json")
        );
    }

    #[test]
    fn test_site_reads_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "content_dir: pages\nmetadata_file: posts.json\n",
        )
        .unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.metadata_path(), dir.path().join("pages").join("posts.json"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_config.yml"), "per_page: 0\n").unwrap();
        assert!(Site::new(dir.path()).is_err());
    }
}
