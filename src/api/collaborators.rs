//! Host Collaborators
//!
//! The services the HTTP host plugs into page reconstruction: a request
//! context, an entity loader, a product catalog, a template-based hook
//! executor and a token generator.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{json, Value};

use crate::cache::{
    AmbientHandle, EntityLoader, HookArg, HookArgs, HookExecutor, LanguageId, ModuleId,
    PersistentEntity, ProductCatalog, ProductRow, RequestContext, TokenGenerator,
};

// == Record Entity ==
/// An entity known only by type and id.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEntity {
    pub type_name: String,
    pub id: Option<u64>,
}

impl RecordEntity {
    pub fn new(type_name: &str, id: Option<u64>) -> Self {
        Self {
            type_name: type_name.to_string(),
            id,
        }
    }
}

impl PersistentEntity for RecordEntity {
    fn entity_type(&self) -> &str {
        &self.type_name
    }

    fn entity_id(&self) -> Option<u64> {
        self.id
    }
}

/// Label carried by the ambient singletons of a host request.
pub fn ambient_handle(kind: &str) -> AmbientHandle {
    Arc::new(kind.to_string())
}

// == Request Scope ==
/// The active request, as seen by reconstruction.
pub struct RequestScope {
    pub language_id: LanguageId,
}

impl RequestContext for RequestScope {
    fn language_id(&self) -> LanguageId {
        self.language_id
    }

    fn templating(&self) -> AmbientHandle {
        ambient_handle("templating")
    }

    fn cookie(&self) -> AmbientHandle {
        ambient_handle("cookie")
    }

    fn context(&self) -> AmbientHandle {
        ambient_handle("context")
    }
}

// == Record Loader ==
/// Rebuilds entities as bare records. Records carry no translated fields,
/// so the language key is not used.
pub struct RecordLoader;

impl EntityLoader for RecordLoader {
    fn load_by_id(
        &self,
        type_name: &str,
        id: u64,
        _language_id: LanguageId,
    ) -> anyhow::Result<Arc<dyn PersistentEntity>> {
        Ok(Arc::new(RecordEntity::new(type_name, Some(id))))
    }
}

// == Row Catalog ==
/// Returns the stored product row with the language filled in.
pub struct RowCatalog;

impl ProductCatalog for RowCatalog {
    fn derive_properties(
        &self,
        language_id: LanguageId,
        row: &ProductRow,
    ) -> anyhow::Result<ProductRow> {
        let mut bundle = row.clone();
        bundle.insert("id_lang".to_string(), json!(language_id));
        Ok(bundle)
    }
}

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("valid placeholder pattern"));

// == Template Executor ==
/// Renders hooks from registered templates, substituting `{param}`
/// placeholders with the reconstructed parameters.
pub struct TemplateExecutor<'a> {
    templates: &'a HashMap<String, String>,
}

impl<'a> TemplateExecutor<'a> {
    pub fn new(templates: &'a HashMap<String, String>) -> Self {
        Self { templates }
    }
}

impl HookExecutor for TemplateExecutor<'_> {
    fn execute(
        &self,
        hook_name: &str,
        params: &HookArgs,
        _module_id: ModuleId,
    ) -> anyhow::Result<String> {
        let template = self
            .templates
            .get(hook_name)
            .ok_or_else(|| anyhow::anyhow!("no fragment registered for {}", hook_name))?;

        // single pass, so substituted values are never expanded again
        let html = PLACEHOLDER.replace_all(template, |caps: &Captures| {
            params
                .get(&caps[1])
                .map(render_arg)
                .unwrap_or_else(|| caps[0].to_string())
        });
        Ok(html.into_owned())
    }
}

fn render_arg(arg: &HookArg) -> String {
    match arg {
        HookArg::Null | HookArg::Ambient(_) | HookArg::Opaque { .. } => String::new(),
        HookArg::Bool(b) => b.to_string(),
        HookArg::Int(i) => i.to_string(),
        HookArg::UInt(u) => u.to_string(),
        HookArg::Float(f) => f.to_string(),
        HookArg::Str(s) => s.clone(),
        HookArg::List(items) => Value::Array(items.clone()).to_string(),
        HookArg::Map(map) => map
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
        HookArg::Entity(entity) => match entity.entity_id() {
            Some(id) => format!("{} #{}", entity.entity_type(), id),
            None => entity.entity_type().to_string(),
        },
    }
}

// == Uuid Tokens ==
/// Generates 32-character lowercase hex tokens.
pub struct UuidTokens;

impl TokenGenerator for UuidTokens {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}
