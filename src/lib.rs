//! Page Cache - full-page HTML cache entries with dynamic sections
//!
//! Stores rendered pages together with descriptions of their dynamic hooks,
//! and rebuilds fresh pages by re-rendering only those hooks.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::{PageCache, PageCacheEntry};
pub use config::Config;
pub use error::PageCacheError;
