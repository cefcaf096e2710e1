//! API Handlers
//!
//! HTTP request handlers for each page cache endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use tracing::debug;

use crate::api::collaborators::{
    RecordLoader, RequestScope, RowCatalog, TemplateExecutor, UuidTokens,
};
use crate::cache::{MemoryPageStore, PageCache, PageCacheEntry, Reconstruction, TokenProtection};
use crate::config::Config;
use crate::error::{PageCacheError, Result};
use crate::models::{
    FragmentRequest, FragmentResponse, HealthResponse, RenderRequest, RenderResponse,
    StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Page cache over the configured store
    pub cache: Arc<PageCache>,
    /// Fragment templates used to render dynamic sections
    pub fragments: Arc<RwLock<HashMap<String, String>>>,
    /// Refresh embedded security tokens on every serve
    pub token_protection: bool,
    /// Language of the requests served by this host
    pub language_id: u64,
}

impl AppState {
    /// Creates a new AppState around the given page cache.
    pub fn new(cache: PageCache, token_protection: bool, language_id: u64) -> Self {
        Self {
            cache: Arc::new(cache),
            fragments: Arc::new(RwLock::new(HashMap::new())),
            token_protection,
            language_id,
        }
    }

    /// Creates a new AppState from configuration, backed by an in-memory store.
    pub fn from_config(config: &Config) -> Self {
        let cache = PageCache::new(Arc::new(MemoryPageStore::with_max_pages(config.max_pages)));
        Self::new(cache, config.token_protection, config.language_id)
    }
}

/// Handler for PUT /pages/:key
///
/// Registers the page's dynamic sections and stores it if it is valid.
pub async fn put_page_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<RenderRequest>,
) -> Result<Json<RenderResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(PageCacheError::InvalidRequest(error_msg));
    }

    let mut entry = PageCacheEntry::new();
    let sections: Vec<String> = req
        .hooks
        .iter()
        .map(|hook| entry.register(hook.module_id, hook.hook_id, &hook.hook, &hook.args()))
        .collect();
    entry.set_content(req.content);

    let stored = state.cache.persist(&key, &entry).await?;

    Ok(Json(RenderResponse {
        key,
        sections,
        valid: entry.is_valid(),
        stored,
    }))
}

/// Handler for GET /pages/:key
///
/// Serves the cached page with its dynamic sections re-rendered.
pub async fn get_page_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Html<String>> {
    let entry = state.cache.load(&key).await?;
    if !entry.exists() {
        return Err(PageCacheError::NotFound(key));
    }

    let hooks = entry.hooks().len();
    let fragments = Arc::clone(&state.fragments);
    let (token_protection, language_id) = (state.token_protection, state.language_id);

    // hook executors may block, so rendering runs off the async workers
    let fresh = tokio::task::spawn_blocking(move || {
        let templates = fragments.blocking_read();
        let executor = TemplateExecutor::new(&templates);
        let request = RequestScope { language_id };
        let ctx = Reconstruction {
            request: &request,
            entities: &RecordLoader,
            products: &RowCatalog,
        };
        let tokens = if token_protection {
            TokenProtection::Enabled(&UuidTokens)
        } else {
            TokenProtection::Disabled
        };

        entry.get_fresh_content(&ctx, &executor, tokens)
    })
    .await
    .map_err(|e| PageCacheError::Internal(format!("Page render task failed: {}", e)))??;
    debug!(key = key.as_str(), hooks, "Served fresh page");

    Ok(Html(fresh))
}

/// Handler for GET /entries/:key
///
/// Returns the stored record as-is.
pub async fn get_entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse> {
    match state.cache.raw(&key).await? {
        Some(serialized) => Ok(([(header::CONTENT_TYPE, "application/json")], serialized)),
        None => Err(PageCacheError::NotFound(key)),
    }
}

/// Handler for PUT /fragments/:hook
///
/// Registers the template used to render a dynamic section.
pub async fn put_fragment_handler(
    State(state): State<AppState>,
    Path(hook): Path<String>,
    Json(req): Json<FragmentRequest>,
) -> Json<FragmentResponse> {
    state
        .fragments
        .write()
        .await
        .insert(hook.clone(), req.template);

    Json(FragmentResponse::new(hook))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats().await))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
