//! HTTP server - maps site URLs onto pages, posts and archive listings

use anyhow::{Context as _, Result};
use axum::{
    extract::{Path, State},
    handler::HandlerWithoutStateExt,
    response::Html,
    routing::get,
    Router,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::{PageRoute, SiteConfig};
use crate::content::{pager, ContentStore, PageResult, PostCollection};
use crate::error::SiteError;
use crate::templates::{ArchiveEntry, ArchiveView, PageView, PostLink, PostView, TemplateRenderer};
use crate::Site;

/// Characters escaped when a category name goes into a URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

type HtmlResult = std::result::Result<Html<String>, SiteError>;

/// Everything a request handler needs, built once at startup
pub struct AppState {
    pub config: SiteConfig,
    pub posts: PostCollection,
    pub content: ContentStore,
    pub templates: TemplateRenderer,
}

impl AppState {
    /// Load the blog index and set up rendering.
    ///
    /// Fails when the blog metadata is missing or malformed; the server must
    /// not start with an inconsistent index.
    pub fn load(site: &Site) -> Result<Self> {
        let posts = PostCollection::load(site.metadata_path())
            .context("Failed to load blog metadata")?;

        let renderer = site.config.markdown_renderer();
        let content = if site.config.cache_content {
            ContentStore::new(&site.content_dir, renderer)
        } else {
            tracing::info!("Content caching disabled, pages are rendered on every request");
            ContentStore::uncached(&site.content_dir, renderer)
        };

        let templates = TemplateRenderer::new(&site.config)?;

        Ok(Self {
            config: site.config.clone(),
            posts,
            content,
            templates,
        })
    }
}

/// `/blog/:year/:month/:slug`
#[derive(Debug, Deserialize)]
pub struct PostPath {
    pub year: String,
    pub month: String,
    pub slug: String,
}

/// `/blog/page/:page`
#[derive(Debug, Deserialize)]
pub struct PagePath {
    pub page: usize,
}

/// `/blog/category/:category`
#[derive(Debug, Deserialize)]
pub struct CategoryPath {
    pub category: String,
}

/// `/blog/category/:category/page/:page`
#[derive(Debug, Deserialize)]
pub struct CategoryPagePath {
    pub category: String,
    pub page: usize,
}

/// Build the application router
pub fn router(state: Arc<AppState>, static_dir: &std::path::Path) -> Router {
    let mut app: Router<Arc<AppState>> = Router::new();

    for page in &state.config.pages {
        let page = page.clone();
        let path = page.path.clone();
        app = app.route(
            &path,
            get(move |State(state): State<Arc<AppState>>| {
                let page = page.clone();
                async move { simple_page(&state, &page) }
            }),
        );
    }

    let static_files = ServeDir::new(static_dir).not_found_service(not_found.into_service());

    app.route("/blog", get(archive_first_page))
        .route("/blog/", get(archive_first_page))
        .route("/blog/page/:page", get(archive_page))
        .route("/blog/category/:category", get(category_first_page))
        .route("/blog/category/:category/page/:page", get(category_page))
        .route("/blog/:year/:month/:slug", get(blog_post))
        .route("/blog/:year/:month/:slug/", get(blog_post))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server and run until Ctrl+C
pub async fn start(site: &Site, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState::load(site)?);
    let app = router(state, &site.static_dir);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn not_found() -> SiteError {
    SiteError::not_found("resource")
}

fn simple_page(state: &AppState, page: &PageRoute) -> HtmlResult {
    let content = state.content.render(&page.content)?;
    let html = state.templates.render_page(&PageView {
        title: page.title.clone(),
        section: page.section.clone(),
        content,
    })?;
    Ok(Html(html))
}

async fn blog_post(State(state): State<Arc<AppState>>, Path(path): Path<PostPath>) -> HtmlResult {
    let post = state.posts.lookup(&path.year, &path.month, &path.slug)?;
    let (previous, next) = state.posts.neighbors(post);
    let content = state.content.render(&post.content_reference())?;

    let html = state.templates.render_post(&PostView {
        title: post.title.clone(),
        post: Arc::clone(post),
        previous: previous.map(|p| PostLink::from(&**p)),
        next: next.map(|p| PostLink::from(&**p)),
        section: state.config.blog_section.clone(),
        content,
    })?;
    Ok(Html(html))
}

async fn archive_first_page(State(state): State<Arc<AppState>>) -> HtmlResult {
    archive(&state, 1)
}

async fn archive_page(State(state): State<Arc<AppState>>, Path(path): Path<PagePath>) -> HtmlResult {
    archive(&state, path.page)
}

async fn category_first_page(
    State(state): State<Arc<AppState>>,
    Path(path): Path<CategoryPath>,
) -> HtmlResult {
    category(&state, &path.category, 1)
}

async fn category_page(
    State(state): State<Arc<AppState>>,
    Path(path): Path<CategoryPagePath>,
) -> HtmlResult {
    category(&state, &path.category, path.page)
}

fn archive(state: &AppState, page: usize) -> HtmlResult {
    let result = pager::paginate(state.posts.newest_first(), page, state.config.per_page)?;
    let intro = if page == 1 {
        state.content.render_optional(&state.config.blog_intro)?
    } else {
        None
    };

    listing(
        state,
        state.config.blog_section.clone(),
        result,
        intro,
        "/blog".to_string(),
    )
}

fn category(state: &AppState, category: &str, page: usize) -> HtmlResult {
    let result = pager::paginate_category(
        state.posts.newest_first(),
        category,
        page,
        state.config.per_page,
    )?;

    listing(
        state,
        format!("Posts in {}", category),
        result,
        None,
        format!(
            "/blog/category/{}",
            utf8_percent_encode(category, PATH_SEGMENT)
        ),
    )
}

fn listing(
    state: &AppState,
    title: String,
    result: PageResult,
    intro: Option<Arc<str>>,
    route_prefix: String,
) -> HtmlResult {
    let posts = result
        .posts
        .into_iter()
        .map(|post| -> std::result::Result<ArchiveEntry, SiteError> {
            // A post without a source is listed bare rather than failing the page
            let content = match state.content.render(&post.content_reference()) {
                Ok(content) => content,
                Err(e) if e.is_not_found() => {
                    tracing::warn!("No content for post {}: {}", post.link, e);
                    Arc::from("")
                }
                Err(e) => return Err(e),
            };
            Ok(ArchiveEntry { post, content })
        })
        .collect::<std::result::Result<Vec<_>, SiteError>>()?;

    let html = state.templates.render_archive(&ArchiveView {
        title,
        posts,
        section: state.config.blog_section.clone(),
        previous_page: result.previous_page,
        next_page: result.next_page,
        intro,
        route_prefix,
    })?;
    Ok(Html(html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const METADATA: &str = r#"[
  {"Title":"First","Link":"/blog/2011/01/first/","Date":"2011-01-05","Categories":["nhibernate"]},
  {"Title":"Second","Link":"/blog/2011/02/second/","Date":"2011-02-05","Categories":["go"]},
  {"Title":"Third","Link":"/blog/2011/03/third/","Date":"2011-03-05","Categories":["nhibernate","c sharp"]}
]"#;

    fn setup(per_page: usize) -> (TempDir, Router) {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(content.join("blog")).unwrap();
        fs::create_dir_all(dir.path().join("static/css")).unwrap();

        fs::write(content.join("blog_metadata.json"), METADATA).unwrap();
        fs::write(content.join("home.md"), "# Welcome home").unwrap();
        fs::write(content.join("blog_intro.md"), "Thoughts on *code*.").unwrap();
        for slug in ["2011-01-first", "2011-02-second", "2011-03-third"] {
            fs::write(content.join("blog").join(format!("{}.md", slug)), format!("Body of {}", slug))
                .unwrap();
        }
        fs::write(dir.path().join("static/css/site.css"), "body {}").unwrap();

        let mut site = Site::new(dir.path()).unwrap();
        site.config.per_page = per_page;
        let state = Arc::new(AppState::load(&site).unwrap());
        let app = router(state, &site.static_dir);
        (dir, app)
    }

    async fn fetch(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    #[tokio::test]
    async fn test_simple_page() {
        let (_dir, app) = setup(2);
        let (status, body) = fetch(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<h1>Welcome home</h1>"));
    }

    #[tokio::test]
    async fn test_configured_page_without_source_is_404() {
        let (_dir, app) = setup(2);
        let (status, _) = fetch(&app, "/consulting").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blog_post_with_neighbors() {
        let (_dir, app) = setup(2);
        let (status, body) = fetch(&app, "/blog/2011/02/second/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Body of 2011-02-second"));
        assert!(body.contains(r#"href="/blog/2011/01/first/""#));
        assert!(body.contains(r#"href="/blog/2011/03/third/""#));

        let (status, _) = fetch(&app, "/blog/2011/02/second").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_post_is_404() {
        let (_dir, app) = setup(2);
        let (status, _) = fetch(&app, "/blog/2011/02/nope/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_archive_first_page() {
        let (_dir, app) = setup(2);
        let (status, body) = fetch(&app, "/blog").await;
        assert_eq!(status, StatusCode::OK);
        // Newest first
        let third = body.find("Body of 2011-03-third").unwrap();
        let second = body.find("Body of 2011-02-second").unwrap();
        assert!(third < second);
        assert!(!body.contains("Body of 2011-01-first"));
        assert!(body.contains("Thoughts on <em>code</em>."));
        assert!(body.contains(r#"href="/blog/page/2""#));
    }

    #[tokio::test]
    async fn test_archive_last_and_past_end_pages() {
        let (_dir, app) = setup(2);
        let (status, body) = fetch(&app, "/blog/page/2").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Body of 2011-01-first"));
        assert!(!body.contains("Thoughts on"));
        assert!(!body.contains(r#"class="older""#));

        let (status, body) = fetch(&app, "/blog/page/9").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No posts here yet."));
    }

    #[tokio::test]
    async fn test_archive_page_zero_is_404() {
        let (_dir, app) = setup(2);
        let (status, _) = fetch(&app, "/blog/page/0").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_category_page() {
        let (_dir, app) = setup(1);
        let (status, body) = fetch(&app, "/blog/category/nhibernate").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Body of 2011-03-third"));
        assert!(!body.contains("Body of 2011-02-second"));
        assert!(body.contains(r#"href="/blog/category/nhibernate/page/2""#));

        let (_, body) = fetch(&app, "/blog/category/nhibernate/page/2").await;
        assert!(body.contains("Body of 2011-01-first"));
    }

    #[tokio::test]
    async fn test_category_with_space_is_encoded_in_links() {
        let (_dir, app) = setup(1);
        let (status, body) = fetch(&app, "/blog/category/c%20sharp").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Body of 2011-03-third"));
        assert!(body.contains(r#"href="/blog/category/c%20sharp/page/2""#));
    }

    #[tokio::test]
    async fn test_category_name_is_escaped() {
        let (_dir, app) = setup(1);
        let (status, body) =
            fetch(&app, "/blog/category/%3Cscript%3Ealert(1)%3C%2Fscript%3E").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.contains("<script>alert(1)</script>"));
        assert!(body.contains("Posts in &lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[tokio::test]
    async fn test_archive_lists_post_without_source() {
        let (dir, app) = setup(5);
        fs::remove_file(dir.path().join("content/blog/2011-02-second.md")).unwrap();
        let (status, body) = fetch(&app, "/blog").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"href="/blog/2011/02/second/""#));
        assert!(body.contains("Body of 2011-03-third"));

        let (status, _) = fetch(&app, "/blog/2011/02/second/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_files_and_missing_resources() {
        let (_dir, app) = setup(2);
        let (status, body) = fetch(&app, "/css/site.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body {}");

        let (status, _) = fetch(&app, "/no/such/thing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_missing_metadata_aborts_startup() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert!(AppState::load(&site).is_err());
    }
}
