//! API Routes
//!
//! Configures the Axum router with all page cache endpoints.

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    get_entry_handler, get_page_handler, health_handler, put_fragment_handler, put_page_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /pages/:key` - Register a rendered page and its dynamic sections
/// - `GET /pages/:key` - Serve a cached page with fresh dynamic sections
/// - `GET /entries/:key` - Inspect the stored record
/// - `PUT /fragments/:hook` - Register the template rendering a hook
/// - `GET /stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/pages/:key", put(put_page_handler).get(get_page_handler))
        .route("/entries/:key", get(get_entry_handler))
        .route("/fragments/:hook", put(put_fragment_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
