//! Record Codec Module
//!
//! Textual form of a cache entry: a pretty-printed JSON object with exactly
//! `hooks` and `content`. Validity and existence are never written.

use serde::{Deserialize, Serialize};

use crate::cache::hook::HookDescriptor;

// == Record Shapes ==
#[derive(Serialize)]
struct RecordRef<'a> {
    hooks: &'a [HookDescriptor],
    content: &'a str,
}

/// A decoded record. Both fields are required; a missing or null one makes
/// the whole record undecodable.
#[derive(Debug, Deserialize)]
pub struct StoredRecord {
    pub hooks: Vec<HookDescriptor>,
    pub content: String,
}

// == Encode ==
/// Encodes hooks and frozen content as pretty-printed JSON.
pub fn encode(hooks: &[HookDescriptor], content: &str) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&RecordRef { hooks, content })
}

// == Decode ==
/// Decodes a stored record, or `None` if it is corrupt or legacy-shaped.
pub fn decode(serialized: &str) -> Option<StoredRecord> {
    serde_json::from_str(serialized).ok()
}
