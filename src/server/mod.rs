//! HTTP server exposing the catalog, post pages and the feed

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::catalog::{tag_path, Catalog};
use crate::config::{SiteConfig, Strategy};
use crate::content::{html_escape, MarkdownRenderer, Post};
use crate::feed;
use crate::generator::CompiledIndex;
use crate::Folio;

/// Everything a request handler can read. Built once, never mutated.
pub struct ServerState {
    catalog: Catalog,
    compiled: Option<CompiledIndex>,
    renderer: MarkdownRenderer,
    config: SiteConfig,
}

impl ServerState {
    pub fn new(catalog: Catalog, compiled: Option<CompiledIndex>, config: SiteConfig) -> Self {
        let renderer = MarkdownRenderer::with_options(&config.highlight);
        Self {
            catalog,
            compiled,
            renderer,
            config,
        }
    }

    /// Load the catalog (and compiled units) for the configured strategy
    pub fn load(folio: &Folio) -> Result<Self> {
        let catalog = Catalog::load(folio)?;
        let compiled = match folio.config.strategy {
            Strategy::Compiled => {
                let index = CompiledIndex::load(&folio.compiled_dir())?;
                tracing::info!("Loaded {} compiled posts", index.len());
                Some(index)
            }
            Strategy::Scan | Strategy::Snapshot => None,
        };
        Ok(Self::new(catalog, compiled, folio.config.clone()))
    }

    /// Compiled HTML for a post body.
    ///
    /// With compiled units loaded, bodies are never kept, so a unit missing
    /// from the index is an error.
    async fn body_html(&self, post: &Post) -> Result<String> {
        if let Some(compiled) = &self.compiled {
            return compiled
                .render(&post.slug)
                .await?
                .ok_or_else(|| anyhow::anyhow!("No compiled unit for '{}'", post.slug));
        }
        let body = post.raw_body.as_deref().unwrap_or("");
        Ok(self.renderer.render(body)?)
    }
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    page: Option<usize>,
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LatestQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct TagSummary<'a> {
    name: &'a str,
    count: usize,
    link: String,
}

/// Build the application router
pub fn router(state: Arc<ServerState>) -> Router {
    let feed_route = format!("/{}", state.config.feed.path.trim_start_matches('/'));

    Router::new()
        .route(&feed_route, get(rss_handler))
        .route("/api/posts", get(posts_handler))
        .route("/api/posts/latest", get(latest_handler))
        .route("/api/posts/:slug", get(post_handler))
        .route("/api/tags", get(tags_handler))
        .route("/api/tags/:tag", get(tag_handler))
        .route("/blog/:slug", get(page_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(folio: &Folio, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(ServerState::load(folio)?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

async fn rss_handler(State(state): State<Arc<ServerState>>) -> Response {
    let body = feed::render_feed(state.catalog.all(), &state.config);
    (
        [
            (header::CONTENT_TYPE, feed::CONTENT_TYPE.to_string()),
            (header::CACHE_CONTROL, state.config.feed.cache_control.clone()),
        ],
        body,
    )
        .into_response()
}

async fn posts_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<PageQuery>,
) -> Response {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(state.config.per_page);
    Json(state.catalog.paginate(page, limit)).into_response()
}

async fn latest_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<LatestQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(state.config.latest_count);
    Json(state.catalog.latest(limit)).into_response()
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    match state.catalog.get(&slug) {
        Some(post) => Json(post).into_response(),
        None => not_found(),
    }
}

async fn tags_handler(State(state): State<Arc<ServerState>>) -> Response {
    let tags: Vec<TagSummary> = state
        .catalog
        .tag_counts()
        .into_iter()
        .map(|(name, count)| TagSummary {
            name,
            count,
            link: tag_path(name),
        })
        .collect();
    Json(tags).into_response()
}

async fn tag_handler(State(state): State<Arc<ServerState>>, Path(tag): Path<String>) -> Response {
    Json(state.catalog.by_tag(&tag)).into_response()
}

async fn page_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    let Some(post) = state.catalog.get(&slug) else {
        return not_found();
    };

    match state.body_html(post).await {
        Ok(body) => {
            let (newer, older) = state.catalog.neighbours(&slug);
            Html(render_page(post, &body, newer, older, &state.config)).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to render post '{}': {}", slug, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
        }
    }
}

/// Wrap a compiled body in a minimal HTML document
fn render_page(
    post: &Post,
    body: &str,
    newer: Option<&Post>,
    older: Option<&Post>,
    site: &SiteConfig,
) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n");
    html.push_str(&format!("<html lang=\"{}\">\n<head>\n", html_escape(&site.language)));
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>{} | {}</title>\n",
        html_escape(&post.title),
        html_escape(&site.title)
    ));
    html.push_str(&format!(
        "<meta name=\"description\" content=\"{}\">\n",
        html_escape(&post.description)
    ));
    if let Some(image) = &post.image {
        html.push_str(&format!(
            "<meta property=\"og:image\" content=\"{}\">\n",
            html_escape(image)
        ));
    }
    html.push_str(&format!(
        "<link rel=\"alternate\" type=\"application/rss+xml\" href=\"/{}\">\n",
        html_escape(site.feed.path.trim_start_matches('/'))
    ));
    html.push_str("</head>\n<body>\n<article>\n");

    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&post.title)));
    let date = post
        .published_date()
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_default();
    html.push_str(&format!(
        "<p class=\"meta\"><time datetime=\"{}\">{}</time> · {}</p>\n",
        html_escape(&post.published_at),
        date,
        html_escape(&post.reading_time)
    ));
    if !post.tags.is_empty() {
        html.push_str("<ul class=\"tags\">");
        for tag in &post.tags {
            html.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>",
                tag_path(tag),
                html_escape(tag)
            ));
        }
        html.push_str("</ul>\n");
    }

    html.push_str(body);
    html.push_str("\n</article>\n<nav>\n");
    if let Some(newer) = newer {
        html.push_str(&format!(
            "<a class=\"newer\" href=\"{}\">{}</a>\n",
            html_escape(&newer.link),
            html_escape(&newer.title)
        ));
    }
    if let Some(older) = older {
        html.push_str(&format!(
            "<a class=\"older\" href=\"{}\">{}</a>\n",
            html_escape(&older.link),
            html_escape(&older.title)
        ));
    }
    html.push_str("</nav>\n</body>\n</html>\n");

    html
}
