//! Built-in site templates using the Tera template engine
//!
//! Templates are embedded in the binary. Each view struct below is the data
//! contract of one template.

use chrono::Datelike;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::Post;
use crate::error::Result;

/// Template renderer with the embedded site theme
pub struct TemplateRenderer {
    tera: Tera,
    site_title: String,
    nav: Vec<NavItem>,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();

        // Autoescape stays on for .html; rendered Markdown is marked `safe`
        tera.set_escape_fn(escape_html);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("markdown.html", include_str!("site/markdown.html")),
            ("post.html", include_str!("site/post.html")),
            ("posts.html", include_str!("site/posts.html")),
            (
                "partials/pager.html",
                include_str!("site/partials/pager.html"),
            ),
        ])?;

        tera.register_filter("date_format", date_format_filter);

        Ok(Self {
            tera,
            site_title: config.title.clone(),
            nav: NavItem::from_config(config),
        })
    }

    /// A simple Markdown page
    pub fn render_page(&self, view: &PageView) -> Result<String> {
        self.render("markdown.html", view, &view.section)
    }

    /// A single blog post
    pub fn render_post(&self, view: &PostView) -> Result<String> {
        self.render("post.html", view, &view.section)
    }

    /// An archive or category listing
    pub fn render_archive(&self, view: &ArchiveView) -> Result<String> {
        self.render("posts.html", view, &view.section)
    }

    fn render<T: Serialize>(&self, template: &str, view: &T, section: &str) -> Result<String> {
        let mut context = Context::from_serialize(view)?;
        context.insert("site_title", &self.site_title);
        context.insert("nav", &self.nav);
        context.insert("section", section);
        context.insert("current_year", &chrono::Local::now().year());
        Ok(self.tera.render(template, &context)?)
    }
}

/// HTML escaping that leaves `/` alone, so links stay readable
fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Tera filter: format a `YYYY-MM-DD` date
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "YYYY-MM-DD".to_string(),
    };

    // "LL" is the long form, e.g. "March 01, 2021"
    if format == "LL" {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
            return Ok(tera::Value::String(date.format("%B %d, %Y").to_string()));
        }
    }

    Ok(tera::Value::String(s))
}

/// Navigation entry, one per configured section
#[derive(Debug, Clone, Serialize)]
pub struct NavItem {
    pub section: String,
    pub path: String,
}

impl NavItem {
    /// First page of each section, followed by the blog
    fn from_config(config: &SiteConfig) -> Vec<NavItem> {
        let mut nav: Vec<NavItem> = Vec::new();
        for page in &config.pages {
            if nav.iter().any(|item| item.section == page.section) {
                continue;
            }
            nav.push(NavItem {
                section: page.section.clone(),
                path: page.path.clone(),
            });
        }
        nav.push(NavItem {
            section: config.blog_section.clone(),
            path: "/blog".to_string(),
        });
        nav
    }
}

/// Data for `markdown.html`
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub title: String,
    pub section: String,
    pub content: Arc<str>,
}

/// Previous/next link on a post page
#[derive(Debug, Clone, Serialize)]
pub struct PostLink {
    pub title: String,
    pub link: String,
}

impl From<&Post> for PostLink {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            link: post.link.clone(),
        }
    }
}

/// Data for `post.html`
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub post: Arc<Post>,
    pub previous: Option<PostLink>,
    pub next: Option<PostLink>,
    pub section: String,
    pub content: Arc<str>,
}

/// One post on an archive page
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveEntry {
    pub post: Arc<Post>,
    pub content: Arc<str>,
}

/// Data for `posts.html`
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveView {
    pub title: String,
    pub posts: Vec<ArchiveEntry>,
    pub section: String,
    pub previous_page: Option<usize>,
    pub next_page: Option<usize>,
    pub intro: Option<Arc<str>>,
    /// Prefix pagination links are built on, e.g. `/blog`
    pub route_prefix: String,
}
