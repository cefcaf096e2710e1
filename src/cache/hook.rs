//! Hook Descriptor Module
//!
//! A dynamic section registered while the page was rendered: which hook to
//! run, for which module, with which described parameters.

use indexmap::IndexMap;
use serde::de::{Error as _, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};

use crate::cache::param::ParamDescriptor;

pub type ModuleId = u64;

/// Prefix of every section id; the full id is `hook:<ordinal>`.
pub const SECTION_PREFIX: &str = "hook:";

// == Hook Descriptor ==
/// One dynamic section of a cached page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookDescriptor {
    /// Section id, also the marker text framing the section in the page
    #[serde(rename = "id")]
    pub section_id: String,
    /// Hook to execute on reconstruction
    #[serde(rename = "hook")]
    pub hook_name: String,
    /// Module that renders the hook
    #[serde(rename = "moduleId")]
    pub module_id: ModuleId,
    /// Described parameters, in call order
    #[serde(default, deserialize_with = "params_or_empty_list")]
    pub params: IndexMap<String, ParamDescriptor>,
}

impl HookDescriptor {
    /// Section id for the `ordinal`-th registered hook (1-based).
    pub fn section_id_for(ordinal: usize) -> String {
        format!("{}{}", SECTION_PREFIX, ordinal)
    }

    /// The marker written on both sides of this section.
    pub fn marker(&self) -> String {
        section_marker(&self.section_id)
    }
}

/// `<!--[hook:N]-->`, used as both the opening and the closing delimiter.
pub fn section_marker(section_id: &str) -> String {
    format!("<!--[{}]-->", section_id)
}

/// Wraps rendered hook output in its section markers.
pub fn wrap_section(section_id: &str, html: &str) -> String {
    let marker = section_marker(section_id);
    format!("{}{}{}", marker, html, marker)
}

/// Older writers encoded an empty parameter mapping as `[]`.
fn params_or_empty_list<'de, D>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, ParamDescriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Params {
        Map(IndexMap<String, ParamDescriptor>),
        List(Vec<IgnoredAny>),
    }

    match Params::deserialize(deserializer)? {
        Params::Map(map) => Ok(map),
        Params::List(items) if items.is_empty() => Ok(IndexMap::new()),
        Params::List(_) => Err(D::Error::custom("hook params must be a mapping")),
    }
}
