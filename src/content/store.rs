//! Content store - resolves content identifiers to Markdown files and renders them

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::post::REFERENCE_SEPARATOR;
use super::MarkdownRenderer;
use crate::cache::{MemoryCache, NoCache, RenderCache};
use crate::error::{Result, SiteError};

/// Sub-directory of the content root holding blog post sources
pub const BLOG_DIR: &str = "blog";

/// Renders Markdown content by identifier.
///
/// Simple pages live at `{root}/{name}.md`. Blog posts are addressed by
/// their content reference and live at `{root}/blog/{reference}.md`. Page
/// names never contain `-`, references always do, so the two never collide.
pub struct ContentStore {
    root: PathBuf,
    renderer: MarkdownRenderer,
    cache: Box<dyn RenderCache>,
}

impl ContentStore {
    /// Store that renders each identifier once per process
    pub fn new<P: AsRef<Path>>(root: P, renderer: MarkdownRenderer) -> Self {
        Self::with_cache(root, renderer, Box::new(MemoryCache::new()))
    }

    /// Store that re-reads and re-renders on every call
    pub fn uncached<P: AsRef<Path>>(root: P, renderer: MarkdownRenderer) -> Self {
        Self::with_cache(root, renderer, Box::new(NoCache))
    }

    pub fn with_cache<P: AsRef<Path>>(
        root: P,
        renderer: MarkdownRenderer,
        cache: Box<dyn RenderCache>,
    ) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            renderer,
            cache,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source path for an identifier, or `None` if it cannot name a file
    /// inside the content root.
    pub fn source_path(&self, identifier: &str) -> Option<PathBuf> {
        let valid = !identifier.is_empty()
            && !identifier.starts_with('.')
            && !identifier.contains(['/', '\\'])
            && !identifier.contains("..");
        if !valid {
            return None;
        }

        let file_name = format!("{}.md", identifier);
        if identifier.contains(REFERENCE_SEPARATOR) {
            Some(self.root.join(BLOG_DIR).join(file_name))
        } else {
            Some(self.root.join(file_name))
        }
    }

    /// Whether a source file exists for the identifier
    pub fn exists(&self, identifier: &str) -> bool {
        self.source_path(identifier)
            .map(|path| path.is_file())
            .unwrap_or(false)
    }

    /// Rendered HTML for an identifier, `NotFound` when there is no source file
    pub fn render(&self, identifier: &str) -> Result<Arc<str>> {
        let path = self
            .source_path(identifier)
            .ok_or_else(|| SiteError::not_found(format!("content {:?}", identifier)))?;

        self.cache.get_or_compute(identifier, &|| {
            let markdown = fs::read_to_string(&path).map_err(|e| match e.kind() {
                ErrorKind::NotFound => SiteError::not_found(format!("content {:?}", identifier)),
                _ => SiteError::Io(e),
            })?;
            Ok(self.renderer.render(&markdown))
        })
    }

    /// Like `render`, but a missing source is `None` instead of an error
    pub fn render_optional(&self, identifier: &str) -> Result<Option<Arc<str>>> {
        match self.render(identifier) {
            Ok(html) => Ok(Some(html)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Number of rendered entries held in the cache
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
