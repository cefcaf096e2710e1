//! Parameter Descriptor Module
//!
//! Hook arguments are live values (entities, request singletons, product
//! rows) that cannot be stored as-is. Each one is reduced to a small tagged
//! descriptor at render time and rebuilt from the active request context
//! when the page is served again.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Number, Value};

use crate::error::{PageCacheError, Result};

// == Wire Tags ==
pub const CONSTANT: &str = "const";
pub const OBJECT_MODEL: &str = "obj";
pub const PRODUCT_PROPERTIES: &str = "prod";
pub const SMARTY_OBJECT: &str = "smarty";
pub const COOKIE_OBJECT: &str = "cookie";
pub const CONTEXT_OBJECT: &str = "context";

/// Keys that together mark a mapping as a product-properties bundle.
const PRODUCT_ROW_MARKERS: [&str; 3] = ["id_product", "category", "link"];

/// Fields the catalog recomputes on every derivation; never stored.
const VOLATILE_PRODUCT_FIELDS: [&str; 20] = [
    "allow_oosp",
    "category",
    "link",
    "attribute_price",
    "price_tax_exc",
    "price",
    "price_without_reduction",
    "reduction",
    "specific_prices",
    "quantity",
    "quantity_all_versions",
    "features",
    "attachments",
    "virtual",
    "pack",
    "packItems",
    "nopackprice",
    "customization_required",
    "rate",
    "tax_name",
];

pub type LanguageId = u64;

/// Product fields as stored in a descriptor, or as returned by the catalog.
pub type ProductRow = Map<String, Value>;

/// Hook arguments in the order the rendering pipeline passed them.
pub type HookArgs = IndexMap<String, HookArg>;

/// Shared handle to a request-scoped singleton.
pub type AmbientHandle = Arc<dyn Any + Send + Sync>;

// == Persistent Entity Capability ==
/// A domain object that can be reloaded from durable storage by type and id.
pub trait PersistentEntity: fmt::Debug + Send + Sync {
    /// Entity type name, used to pick the loader on reconstruction.
    fn entity_type(&self) -> &str;

    /// Primary key; `None` for objects that were never persisted.
    fn entity_id(&self) -> Option<u64>;
}

// == Ambient Objects ==
/// Request-scoped singletons a hook may receive.
#[derive(Clone)]
pub enum AmbientObject {
    /// Templating engine context
    Templating(AmbientHandle),
    /// Visitor cookie
    Cookie(AmbientHandle),
    /// The request context itself
    Context(AmbientHandle),
}

impl fmt::Debug for AmbientObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmbientObject::Templating(_) => f.write_str("Templating(..)"),
            AmbientObject::Cookie(_) => f.write_str("Cookie(..)"),
            AmbientObject::Context(_) => f.write_str("Context(..)"),
        }
    }
}

// == Hook Argument ==
/// A runtime value handed to a dynamic hook.
#[derive(Debug, Clone)]
pub enum HookArg {
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned integer beyond the signed range
    UInt(u64),
    Float(f64),
    Str(String),
    /// Positional compound value
    List(Vec<Value>),
    /// Keyed compound value
    Map(Map<String, Value>),
    /// Persistent entity
    Entity(Arc<dyn PersistentEntity>),
    /// Request-scoped singleton
    Ambient(AmbientObject),
    /// Closures, resources and any object with no known rebuild strategy
    Opaque { type_name: String },
}

impl HookArg {
    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HookArg::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the mapping payload, if this is a keyed compound value.
    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            HookArg::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<Value> for HookArg {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => HookArg::Null,
            Value::Bool(b) => HookArg::Bool(b),
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => HookArg::Int(i),
                (None, Some(u)) => HookArg::UInt(u),
                _ => HookArg::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => HookArg::Str(s),
            Value::Array(items) => HookArg::List(items),
            Value::Object(map) => HookArg::Map(map),
        }
    }
}

impl From<&str> for HookArg {
    fn from(value: &str) -> Self {
        HookArg::Str(value.to_string())
    }
}

impl From<i64> for HookArg {
    fn from(value: i64) -> Self {
        HookArg::Int(value)
    }
}

impl From<bool> for HookArg {
    fn from(value: bool) -> Self {
        HookArg::Bool(value)
    }
}

// == Reconstruction Collaborators ==
/// The active request, as seen by parameter reconstruction.
pub trait RequestContext: Send + Sync {
    /// Language used as the implicit secondary key for entity loads.
    fn language_id(&self) -> LanguageId;
    fn templating(&self) -> AmbientHandle;
    fn cookie(&self) -> AmbientHandle;
    fn context(&self) -> AmbientHandle;
}

/// Loads persistent entities by type name and id.
pub trait EntityLoader: Send + Sync {
    fn load_by_id(
        &self,
        type_name: &str,
        id: u64,
        language_id: LanguageId,
    ) -> anyhow::Result<Arc<dyn PersistentEntity>>;
}

/// Re-derives a full product-properties bundle from a stored row.
pub trait ProductCatalog: Send + Sync {
    fn derive_properties(&self, language_id: LanguageId, row: &ProductRow)
        -> anyhow::Result<ProductRow>;
}

/// Everything a descriptor may need to rebuild its value.
#[derive(Clone, Copy)]
pub struct Reconstruction<'a> {
    pub request: &'a dyn RequestContext,
    pub entities: &'a dyn EntityLoader,
    pub products: &'a dyn ProductCatalog,
}

// == Parameter Descriptor ==
/// Serializable stand-in for a hook argument, tagged by rebuild strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDescriptor {
    /// Scalar reproduced verbatim
    Constant(Value),
    /// Entity re-fetched by type and id
    ObjectModel { class: String, id: u64 },
    /// Product bundle re-derived from the stored subset of fields
    ProductProperties(ProductRow),
    SmartyContext,
    Cookie,
    RequestContext,
    /// Decoded record with a tag or payload this build does not know.
    /// Kept verbatim so re-serializing does not lose it.
    Unrecognized(Value),
}

impl ParamDescriptor {
    // == Describe ==
    /// Builds a descriptor for `arg`, or `None` if it cannot be rebuilt later.
    pub fn describe(arg: &HookArg) -> Option<Self> {
        match arg {
            HookArg::Null => Some(Self::Constant(Value::Null)),
            HookArg::Bool(b) => Some(Self::Constant(Value::Bool(*b))),
            HookArg::Int(i) => Some(Self::Constant(Value::from(*i))),
            HookArg::UInt(u) => Some(Self::Constant(Value::from(*u))),
            HookArg::Float(f) => Number::from_f64(*f).map(|n| Self::Constant(Value::Number(n))),
            HookArg::Str(s) => Some(Self::Constant(Value::String(s.clone()))),
            HookArg::Map(map) => describe_product_row(map),
            HookArg::Entity(entity) => entity.entity_id().map(|id| Self::ObjectModel {
                class: entity.entity_type().to_string(),
                id,
            }),
            HookArg::Ambient(AmbientObject::Templating(_)) => Some(Self::SmartyContext),
            HookArg::Ambient(AmbientObject::Cookie(_)) => Some(Self::Cookie),
            HookArg::Ambient(AmbientObject::Context(_)) => Some(Self::RequestContext),
            HookArg::List(_) | HookArg::Opaque { .. } => None,
        }
    }

    // == Reconstruct ==
    /// Rebuilds the live value against the active request.
    ///
    /// An unrecognized descriptor is a hard error: the record is corrupt or
    /// was written by an incompatible version.
    pub fn reconstruct(&self, ctx: &Reconstruction<'_>) -> Result<HookArg> {
        match self {
            Self::Constant(value) => Ok(HookArg::from(value.clone())),
            Self::ObjectModel { class, id } => ctx
                .entities
                .load_by_id(class, *id, ctx.request.language_id())
                .map(HookArg::Entity)
                .map_err(|source| PageCacheError::Collaborator {
                    what: format!("loading {} #{}", class, id),
                    source,
                }),
            Self::ProductProperties(row) => ctx
                .products
                .derive_properties(ctx.request.language_id(), row)
                .map(HookArg::Map)
                .map_err(|source| PageCacheError::Collaborator {
                    what: "deriving product properties".to_string(),
                    source,
                }),
            Self::SmartyContext => Ok(HookArg::Ambient(AmbientObject::Templating(
                ctx.request.templating(),
            ))),
            Self::Cookie => Ok(HookArg::Ambient(AmbientObject::Cookie(ctx.request.cookie()))),
            Self::RequestContext => Ok(HookArg::Ambient(AmbientObject::Context(
                ctx.request.context(),
            ))),
            Self::Unrecognized(raw) => Err(PageCacheError::UnknownDescriptor(
                raw.get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("<missing>")
                    .to_string(),
            )),
        }
    }

    // == Wire Form ==
    fn to_wire(&self) -> Value {
        match self {
            Self::Constant(value) => json!({ "type": CONSTANT, "value": value }),
            Self::ObjectModel { class, id } => {
                json!({ "type": OBJECT_MODEL, "class": class, "id": id })
            }
            Self::ProductProperties(row) => json!({ "type": PRODUCT_PROPERTIES, "row": row }),
            Self::SmartyContext => json!({ "type": SMARTY_OBJECT }),
            Self::Cookie => json!({ "type": COOKIE_OBJECT }),
            Self::RequestContext => json!({ "type": CONTEXT_OBJECT }),
            Self::Unrecognized(raw) => raw.clone(),
        }
    }

    fn from_wire(raw: Value) -> Self {
        let parsed = match raw.get("type").and_then(Value::as_str) {
            Some(CONSTANT) => Some(Self::Constant(
                raw.get("value").cloned().unwrap_or(Value::Null),
            )),
            Some(OBJECT_MODEL) => {
                let class = raw.get("class").and_then(Value::as_str);
                let id = raw.get("id").and_then(wire_id);
                match (class, id) {
                    (Some(class), Some(id)) => Some(Self::ObjectModel {
                        class: class.to_string(),
                        id,
                    }),
                    _ => None,
                }
            }
            Some(PRODUCT_PROPERTIES) => match raw.get("row") {
                Some(Value::Object(row)) => Some(Self::ProductProperties(row.clone())),
                // legacy writers encoded an empty row as a list
                Some(Value::Array(items)) if items.is_empty() => {
                    Some(Self::ProductProperties(ProductRow::new()))
                }
                _ => None,
            },
            Some(SMARTY_OBJECT) => Some(Self::SmartyContext),
            Some(COOKIE_OBJECT) => Some(Self::Cookie),
            Some(CONTEXT_OBJECT) => Some(Self::RequestContext),
            _ => None,
        };
        parsed.unwrap_or(Self::Unrecognized(raw))
    }
}

impl Serialize for ParamDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ParamDescriptor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_wire)
    }
}

// == Helpers ==
fn wire_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Describes a mapping as a product row, or `None` for any other mapping.
fn describe_product_row(map: &Map<String, Value>) -> Option<ParamDescriptor> {
    if !PRODUCT_ROW_MARKERS.iter().all(|key| map.contains_key(*key)) {
        return None;
    }

    let mut row: ProductRow = map
        .iter()
        .filter(|(key, _)| !VOLATILE_PRODUCT_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    normalize_image_id(&mut row);

    Some(ParamDescriptor::ProductProperties(row))
}

/// Reduces a composite `"<product>-<image>"` id to its image component.
///
/// Zero or unparsable image components drop the field. Values without a
/// separator after the first character are left untouched.
fn normalize_image_id(row: &mut ProductRow) {
    let image_id = match row.get("id_image") {
        Some(Value::String(raw)) => match raw.find('-') {
            Some(pos) if pos > 0 => raw[pos + 1..]
                .split('-')
                .next()
                .map(leading_integer)
                .unwrap_or(0),
            _ => return,
        },
        _ => return,
    };

    if image_id > 0 {
        row.insert("id_image".to_string(), Value::from(image_id));
    } else {
        row.remove("id_image");
    }
}

/// Parses the leading run of digits, ignoring leading whitespace.
fn leading_integer(raw: &str) -> u64 {
    let trimmed = raw.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().unwrap_or(0)
}
