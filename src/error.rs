//! Error types for the page cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Page Cache Error Enum ==
/// Unified error type for the page cache.
///
/// Description failures and malformed records never show up here: the first
/// only invalidates the entry, the second is treated as a cache miss.
#[derive(Error, Debug)]
pub enum PageCacheError {
    /// A stored parameter descriptor carries a tag this build cannot rebuild
    #[error("Can't instantiate parameter, unknown type: {0}")]
    UnknownDescriptor(String),

    /// An external collaborator (executor, entity loader, catalog) failed
    #[error("{what} failed: {source}")]
    Collaborator {
        what: String,
        #[source]
        source: anyhow::Error,
    },

    /// Key not found in the page store
    #[error("Page not cached: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for PageCacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            PageCacheError::NotFound(_) => StatusCode::NOT_FOUND,
            PageCacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PageCacheError::Collaborator { .. } => StatusCode::BAD_GATEWAY,
            PageCacheError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            PageCacheError::UnknownDescriptor(_) | PageCacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the page cache.
pub type Result<T> = std::result::Result<T, PageCacheError>;
