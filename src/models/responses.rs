//! Response DTOs for the page cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::PageCacheStats;

/// Response body for storing a rendered page (PUT /pages/:key)
#[derive(Debug, Clone, Serialize)]
pub struct RenderResponse {
    /// The page key
    pub key: String,
    /// Section ids assigned to the hooks, in order
    pub sections: Vec<String>,
    /// Whether every hook parameter could be described
    pub valid: bool,
    /// Whether the entry was written to the store
    pub stored: bool,
}

/// Response body for registering a fragment template (PUT /fragments/:hook)
#[derive(Debug, Clone, Serialize)]
pub struct FragmentResponse {
    /// Success message
    pub message: String,
    /// The hook the template renders
    pub hook: String,
}

impl FragmentResponse {
    /// Creates a new FragmentResponse
    pub fn new(hook: impl Into<String>) -> Self {
        let hook = hook.into();
        Self {
            message: format!("Fragment for '{}' registered", hook),
            hook,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing usable
    pub misses: u64,
    /// Entries written
    pub stored: u64,
    /// Entries refused as invalid
    pub rejected: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<PageCacheStats> for StatsResponse {
    fn from(stats: PageCacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            stored: stats.stored,
            rejected: stats.rejected,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
