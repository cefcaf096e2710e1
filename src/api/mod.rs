//! API Module
//!
//! HTTP host for the page cache: registers rendered pages and serves them
//! back with fresh dynamic sections.
//!
//! # Endpoints
//! - `PUT /pages/:key` - Register a rendered page
//! - `GET /pages/:key` - Serve a cached page
//! - `GET /entries/:key` - Inspect the stored record
//! - `PUT /fragments/:hook` - Register a fragment template
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod collaborators;
pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
