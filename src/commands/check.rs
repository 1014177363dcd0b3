//! Check that blog metadata, pages and Markdown sources agree

use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::content::{ContentStore, PostCollection};
use crate::Site;

/// Outcome of a site check
#[derive(Debug, Default)]
pub struct Report {
    pub posts: usize,
    pub pages: usize,
    pub rendered: usize,
    /// Posts or pages whose source is missing or fails to render
    pub problems: Vec<String>,
    /// Blog sources no post refers to
    pub orphans: Vec<PathBuf>,
}

impl Report {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn print(&self) {
        println!(
            "Checked {} posts and {} pages, rendered {}",
            self.posts, self.pages, self.rendered
        );
        for problem in &self.problems {
            println!("  ✗ {}", problem);
        }
        for orphan in &self.orphans {
            println!("  ? unreferenced: {}", orphan.display());
        }
    }
}

/// Load the index and render every post and configured page once.
///
/// Malformed metadata is an error, not a report entry.
pub fn run(site: &Site) -> Result<Report> {
    let posts = PostCollection::load(site.metadata_path())?;
    let store = ContentStore::uncached(&site.content_dir, site.config.markdown_renderer());

    let mut report = Report {
        posts: posts.len(),
        pages: site.config.pages.len(),
        ..Default::default()
    };

    let mut referenced = HashSet::new();
    for post in posts.oldest_first() {
        let reference = post.content_reference();
        match store.render(&reference) {
            Ok(_) => report.rendered += 1,
            Err(e) => report
                .problems
                .push(format!("post {} ({}): {}", post.link, reference, e)),
        }
        referenced.insert(reference);
    }

    for page in &site.config.pages {
        match store.render(&page.content) {
            Ok(_) => report.rendered += 1,
            Err(e) => report
                .problems
                .push(format!("page {} ({}): {}", page.path, page.content, e)),
        }
    }

    report.orphans = unreferenced_sources(&site.content_dir.join("blog"), &referenced);

    tracing::debug!(
        "Check finished: {} problems, {} orphans",
        report.problems.len(),
        report.orphans.len()
    );
    Ok(report)
}

/// Markdown files under `blog_dir` whose stem is not a known reference
fn unreferenced_sources(blog_dir: &Path, referenced: &HashSet<String>) -> Vec<PathBuf> {
    let mut orphans: Vec<PathBuf> = WalkDir::new(blog_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| path.extension().map(|ext| ext == "md").unwrap_or(false))
        .filter(|path| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .map(|stem| !referenced.contains(stem))
                .unwrap_or(true)
        })
        .collect();
    orphans.sort();
    orphans
}
