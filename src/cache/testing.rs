//! Test doubles for the page cache collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::cache::entry::HookExecutor;
use crate::cache::hook::ModuleId;
use crate::cache::param::{
    AmbientHandle, EntityLoader, HookArgs, LanguageId, PersistentEntity, ProductCatalog,
    ProductRow, Reconstruction, RequestContext,
};
use crate::cache::token::TokenGenerator;

/// Minimal persistent entity.
#[derive(Debug)]
pub struct FakeEntity {
    type_name: String,
    id: Option<u64>,
}

impl FakeEntity {
    pub fn new(type_name: &str, id: Option<u64>) -> Self {
        Self {
            type_name: type_name.to_string(),
            id,
        }
    }
}

impl PersistentEntity for FakeEntity {
    fn entity_type(&self) -> &str {
        &self.type_name
    }

    fn entity_id(&self) -> Option<u64> {
        self.id
    }
}

/// Request context with a fixed language and labelled singletons.
pub struct FakeRequest {
    language_id: LanguageId,
}

impl RequestContext for FakeRequest {
    fn language_id(&self) -> LanguageId {
        self.language_id
    }

    fn templating(&self) -> AmbientHandle {
        Arc::new("templating")
    }

    fn cookie(&self) -> AmbientHandle {
        Arc::new("cookie")
    }

    fn context(&self) -> AmbientHandle {
        Arc::new("context")
    }
}

/// Loads any entity type except `Missing`, recording each call.
#[derive(Default)]
pub struct RecordingLoader {
    calls: Mutex<Vec<(String, u64, LanguageId)>>,
}

impl RecordingLoader {
    pub fn calls(&self) -> Vec<(String, u64, LanguageId)> {
        self.calls.lock().unwrap().clone()
    }
}

impl EntityLoader for RecordingLoader {
    fn load_by_id(
        &self,
        type_name: &str,
        id: u64,
        language_id: LanguageId,
    ) -> anyhow::Result<Arc<dyn PersistentEntity>> {
        self.calls
            .lock()
            .unwrap()
            .push((type_name.to_string(), id, language_id));
        if type_name == "Missing" {
            anyhow::bail!("no such entity");
        }
        Ok(Arc::new(FakeEntity::new(type_name, Some(id))))
    }
}

/// Echoes the stored row back with the language added.
pub struct EchoCatalog;

impl ProductCatalog for EchoCatalog {
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

/// Renders fixed fragments by hook name and records every call.
#[derive(Default)]
pub struct FixedExecutor {
    fragments: HashMap<String, String>,
    calls: Mutex<Vec<(String, Vec<String>, ModuleId)>>,
}

impl FixedExecutor {
    pub fn calls(&self) -> Vec<(String, Vec<String>, ModuleId)> {
        self.calls.lock().unwrap().clone()
    }
}

impl HookExecutor for FixedExecutor {
    fn execute(
        &self,
        hook_name: &str,
        params: &HookArgs,
        module_id: ModuleId,
    ) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push((
            hook_name.to_string(),
            params.keys().cloned().collect(),
            module_id,
        ));
        self.fragments
            .get(hook_name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("hook {} is not registered", hook_name))
    }
}

/// Always hands out the same token.
pub struct FixedToken(pub String);

impl TokenGenerator for FixedToken {
    fn generate(&self) -> String {
        self.0.clone()
    }
}

/// All collaborators needed to reconstruct and render an entry.
pub struct TestCollaborators {
    pub request: FakeRequest,
    pub entities: RecordingLoader,
    pub products: EchoCatalog,
    pub executor: FixedExecutor,
}

impl TestCollaborators {
    pub fn new(language_id: LanguageId) -> Self {
        Self {
            request: FakeRequest { language_id },
            entities: RecordingLoader::default(),
            products: EchoCatalog,
            executor: FixedExecutor::default(),
        }
    }

    pub fn with_fragment(mut self, hook_name: &str, html: &str) -> Self {
        self.executor
            .fragments
            .insert(hook_name.to_string(), html.to_string());
        self
    }

    pub fn reconstruction(&self) -> Reconstruction<'_> {
        Reconstruction {
            request: &self.request,
            entities: &self.entities,
            products: &self.products,
        }
    }
}

/// A product-properties mapping for product 7, merged with `extra`.
pub fn product_row(extra: Value) -> Value {
    let mut row = json!({
        "id_product": 7,
        "category": "mugs",
        "link": "https://shop.example/7-mug",
    });
    if let (Some(row), Value::Object(extra)) = (row.as_object_mut(), extra) {
        row.extend(extra);
    }
    row
}
