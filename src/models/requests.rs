//! Request DTOs for the page cache API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::api::collaborators::{ambient_handle, RecordEntity};
use crate::cache::{AmbientObject, HookArg, HookArgs, ModuleId};

/// Request body for storing a rendered page (PUT /pages/:key)
///
/// `content` must already carry `<!--[hook:N]-->` markers, where `N` is the
/// 1-based position of the hook in `hooks`.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderRequest {
    /// Rendered page HTML
    pub content: String,
    /// Dynamic sections in render order
    #[serde(default)]
    pub hooks: Vec<HookRegistration>,
}

/// One dynamic section of a rendered page.
///
/// Parameters are plain JSON. Objects with an `@entity`, `@ambient` or
/// `@opaque` key stand for live objects:
/// - `{"@entity": "Category", "id": 3}`
/// - `{"@ambient": "templating" | "cookie" | "context"}`
/// - `{"@opaque": "Closure"}`
#[derive(Debug, Clone, Deserialize)]
pub struct HookRegistration {
    pub module_id: ModuleId,
    #[serde(default)]
    pub hook_id: u64,
    pub hook: String,
    #[serde(default)]
    pub params: IndexMap<String, Value>,
}

impl RenderRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.hooks.iter().any(|h| h.hook.is_empty()) {
            return Some("Hook name cannot be empty".to_string());
        }
        None
    }
}

impl HookRegistration {
    /// Converts the JSON parameters into hook arguments, keeping their order.
    pub fn args(&self) -> HookArgs {
        self.params
            .iter()
            .map(|(key, value)| (key.clone(), param_to_arg(value.clone())))
            .collect()
    }
}

/// Request body for registering a fragment template (PUT /fragments/:hook)
#[derive(Debug, Clone, Deserialize)]
pub struct FragmentRequest {
    /// HTML with `{param}` placeholders
    pub template: String,
}

fn param_to_arg(value: Value) -> HookArg {
    let Value::Object(map) = value else {
        return HookArg::from(value);
    };

    if let Some(type_name) = map.get("@entity").and_then(Value::as_str) {
        return HookArg::Entity(Arc::new(RecordEntity::new(
            type_name,
            map.get("id").and_then(Value::as_u64),
        )));
    }

    if let Some(kind) = map.get("@ambient").and_then(Value::as_str) {
        let handle = ambient_handle(kind);
        match kind {
            "templating" => return HookArg::Ambient(AmbientObject::Templating(handle)),
            "cookie" => return HookArg::Ambient(AmbientObject::Cookie(handle)),
            "context" => return HookArg::Ambient(AmbientObject::Context(handle)),
            _ => {}
        }
    }

    if let Some(type_name) = map.get("@opaque").and_then(Value::as_str) {
        return HookArg::Opaque {
            type_name: type_name.to_string(),
        };
    }

    HookArg::Map(map)
}
