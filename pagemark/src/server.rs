use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{ContentType, Header, Status};
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{get, routes, Build, Request, Response, Rocket, State};
use serde::Serialize;
use tracing::{debug, error};

use common::Config;

use crate::llm::LlmProvider;
use crate::{extract, image_search, llm, markdown, scraping};

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub started_at: DateTime<Utc>,
    pub config: Option<Arc<Config>>,
    pub llm_provider: Option<Arc<dyn LlmProvider>>,
}

/// Response structure for `/api/v1/status`.
#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    uptime_seconds: i64,
    llm_configured: bool,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = Custom<Json<ErrorBody>>;

const URL_REQUIRED: &str = "URL parameter is required and must be a non-empty string";
const QUERY_REQUIRED: &str = "Search query is required and must be a non-empty string";
const CRAWL_FAILED: &str =
    "Failed to crawl the provided URL. Please ensure the URL is correct and try again later.";
const PROCESS_FAILED: &str =
    "Failed to process the provided URL. Please ensure the URL is correct and try again later.";
const IMAGES_FAILED: &str = "Error fetching the images. Please try again later.";

fn bad_request(message: &str) -> ApiError {
    Custom(
        Status::BadRequest,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

fn internal_error(message: &str) -> ApiError {
    Custom(
        Status::InternalServerError,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

fn markdown_response(body: String) -> (ContentType, String) {
    (ContentType::new("text", "markdown"), body)
}

/// Require a non-empty query parameter after trimming.
fn require_param(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

/// Status endpoint returning simple JSON with uptime and provider info.
#[get("/api/v1/status")]
async fn status(state: &State<AppState>) -> Json<StatusResponse> {
    let now = Utc::now();
    let uptime = (now - state.started_at).num_seconds();

    Json(StatusResponse {
        status: "ok",
        uptime_seconds: uptime,
        llm_configured: state.llm_provider.is_some(),
    })
}

/// Scrape a page, isolate the readable article, and return it as Markdown.
#[get("/api/v1/web?<url>")]
async fn crawl_web(
    state: &State<AppState>,
    url: Option<String>,
) -> Result<(ContentType, String), ApiError> {
    let Some(url) = require_param(&url) else {
        return Err(bad_request(URL_REQUIRED));
    };

    let scrape_cfg = state.config.as_ref().and_then(|c| c.scrape.as_ref());
    let options = scraping::ScrapeOptions::from_config(url, scrape_cfg);

    let html = scraping::fetch_rendered_page(options).await.map_err(|e| {
        error!("failed to crawl URL {}: {:#}", url, e);
        internal_error(CRAWL_FAILED)
    })?;

    let article = extract::extract_article(&html, url).map_err(|e| {
        error!("failed to extract article from {}: {:#}", url, e);
        internal_error(CRAWL_FAILED)
    })?;

    let markdown = markdown::html_to_markdown(&article.content).map_err(|e| {
        error!("failed to convert {} to markdown: {:#}", url, e);
        internal_error(CRAWL_FAILED)
    })?;

    debug!(
        "crawled {} ('{}'): {}",
        url,
        article.title,
        markdown::excerpt(&markdown)
    );

    Ok(markdown_response(markdown))
}

/// Scrape an authentication-gated page (cookies loaded first), convert the raw
/// rendered DOM to Markdown, and pass the result through the LLM rewrite.
#[get("/api/v1/x?<url>")]
async fn crawl_x(
    state: &State<AppState>,
    url: Option<String>,
) -> Result<(ContentType, String), ApiError> {
    let Some(url) = require_param(&url) else {
        return Err(bad_request(URL_REQUIRED));
    };

    let Some(provider) = state.llm_provider.clone() else {
        error!("x route called but no LLM provider is configured");
        return Err(internal_error(PROCESS_FAILED));
    };

    let scrape_cfg = state.config.as_ref().and_then(|c| c.scrape.as_ref());
    let mut options = scraping::ScrapeOptions::from_config(url, scrape_cfg);
    if let Some(path) = scrape_cfg.and_then(|c| c.cookies_file.clone()) {
        options = options.with_cookies_file(path);
    }

    let html = scraping::fetch_rendered_page(options).await.map_err(|e| {
        error!("failed to scrape URL {}: {:#}", url, e);
        internal_error(PROCESS_FAILED)
    })?;

    // Raw DOM conversion on purpose: readability tends to discard short
    // social-media posts entirely
    let markdown = markdown::html_to_markdown(&html).map_err(|e| {
        error!("failed to convert {} to markdown: {:#}", url, e);
        internal_error(PROCESS_FAILED)
    })?;

    let rewritten = llm::rewrite::rewrite_markdown(provider.as_ref(), &markdown)
        .await
        .map_err(|e| {
            error!("failed to rewrite markdown for {}: {:#}", url, e);
            internal_error(PROCESS_FAILED)
        })?;

    Ok(markdown_response(rewritten))
}

/// Reverse-image-search a query and return the results as Markdown image tags.
#[get("/api/v1/image?<q>")]
async fn image_lookup(
    state: &State<AppState>,
    q: Option<String>,
) -> Result<(ContentType, String), ApiError> {
    let Some(query) = require_param(&q) else {
        return Err(bad_request(QUERY_REQUIRED));
    };

    let search_cfg = state.config.as_ref().and_then(|c| c.image_search.as_ref());
    let base_url = search_cfg
        .and_then(|c| c.base_url.as_deref())
        .unwrap_or(image_search::DEFAULT_SEARCH_BASE_URL);
    let timeout = search_cfg
        .and_then(|c| c.timeout_seconds)
        .unwrap_or(image_search::DEFAULT_TIMEOUT_SECS);

    let markdown = image_search::search_images_markdown(query, base_url, timeout)
        .await
        .map_err(|e| {
            error!("image search failed for '{}': {:#}", query, e);
            internal_error(IMAGES_FAILED)
        })?;

    Ok(markdown_response(markdown))
}

/// Permissive CORS, matching the original deployment (origin `*`).
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Permissive CORS headers",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
    }
}

/// Assemble the Rocket instance: managed state, CORS fairing, routes.
///
/// Bind address and port come from the `[server]` config section when present;
/// anything else falls through to Rocket's own figment defaults.
pub fn build_rocket(
    config: Option<Arc<Config>>,
    llm_provider: Option<Arc<dyn LlmProvider>>,
) -> Rocket<Build> {
    let state = AppState {
        started_at: Utc::now(),
        config: config.clone(),
        llm_provider,
    };

    let mut fig = rocket::Config::figment();
    if let Some(server_cfg) = config.as_ref().and_then(|c| c.server.as_ref()) {
        if let Some(bind) = &server_cfg.bind {
            fig = fig.merge(("address", bind.clone()));
        }
        if let Some(port) = server_cfg.port {
            fig = fig.merge(("port", port));
        }
    }

    rocket::custom(fig).manage(state).attach(Cors).mount(
        "/",
        routes![health, status, crawl_web, crawl_x, image_lookup],
    )
}

/// Launch the Rocket server. Blocks until the server shuts down.
pub async fn launch_rocket(
    config: Option<Arc<Config>>,
    llm_provider: Option<Arc<dyn LlmProvider>>,
) -> Result<()> {
    let rocket = build_rocket(config, llm_provider);

    // Launch Rocket - this will run until shutdown (SIGINT/SIGTERM etc.)
    tracing::info!("Starting Rocket HTTP server");
    rocket
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
