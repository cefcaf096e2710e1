//! Page Cache Entry Module
//!
//! A rendered page frozen together with the dynamic sections that must be
//! recomputed every time it is served.

use std::borrow::Cow;

use indexmap::IndexMap;
use regex::{NoExpand, Regex};
use tracing::{debug, warn};

use crate::cache::codec;
use crate::cache::hook::{section_marker, HookDescriptor, ModuleId};
use crate::cache::param::{HookArgs, ParamDescriptor, Reconstruction};
use crate::cache::token::{rewrite_token, TokenProtection};
use crate::error::{PageCacheError, Result};

// == Hook Executor ==
/// Renders one dynamic section.
///
/// Implementations must run the hook with page caching disabled so the
/// nested call is not cached on its own.
pub trait HookExecutor: Send + Sync {
    fn execute(&self, hook_name: &str, params: &HookArgs, module_id: ModuleId)
        -> anyhow::Result<String>;
}

// == Page Cache Entry ==
/// Frozen page content plus the hooks needed to refresh it.
#[derive(Debug, Clone)]
pub struct PageCacheEntry {
    /// Page HTML as rendered, with section markers
    content: String,
    /// Dynamic sections in registration order
    hooks: Vec<HookDescriptor>,
    /// Loaded from a non-empty, well-formed record
    exists: bool,
    /// Every hook parameter could be described
    valid: bool,
}

impl Default for PageCacheEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCacheEntry {
    // == Constructor ==
    /// Creates an empty, valid entry that does not exist in storage yet.
    pub fn new() -> Self {
        Self {
            content: String::new(),
            hooks: Vec::new(),
            exists: false,
            valid: true,
        }
    }

    // == Load ==
    /// Creates an entry from whatever the storage returned for its key.
    ///
    /// Missing, empty, corrupt or partial records all yield a fresh entry;
    /// they are cache misses, not errors.
    pub fn from_serialized(serialized: Option<&str>) -> Self {
        let mut entry = Self::new();

        let Some(serialized) = serialized.filter(|s| !s.is_empty()) else {
            return entry;
        };

        match codec::decode(serialized) {
            Some(record) => {
                entry.hooks = record.hooks;
                entry.content = record.content;
                entry.exists = true;
            }
            None => debug!("Ignoring malformed page cache record"),
        }
        entry
    }

    // == Serialize ==
    /// Encodes hooks and frozen content for the storage backend.
    pub fn serialize(&self) -> Result<String> {
        codec::encode(&self.hooks, &self.content)
            .map_err(|e| PageCacheError::Internal(format!("Failed to encode entry: {}", e)))
    }

    // == State ==
    /// True if this entry was loaded from storage.
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// True if every hook can be reconstructed. Invalid entries must not be
    /// stored, and their fresh content must not be requested.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    // == Content ==
    /// Sets the rendered page HTML.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Returns the page HTML exactly as stored, dynamic sections included.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the registered dynamic sections.
    pub fn hooks(&self) -> &[HookDescriptor] {
        &self.hooks
    }

    // == Register ==
    /// Registers a dynamic section and returns its section id.
    ///
    /// The caller wraps the hook output in markers built from the returned
    /// id. A parameter that cannot be described invalidates the entry, but
    /// the section is still registered.
    pub fn register(
        &mut self,
        module_id: ModuleId,
        hook_id: u64,
        hook_name: &str,
        params: &HookArgs,
    ) -> String {
        let section_id = HookDescriptor::section_id_for(self.hooks.len() + 1);

        let mut described = IndexMap::with_capacity(params.len());
        for (key, arg) in params {
            match ParamDescriptor::describe(arg) {
                Some(descriptor) => {
                    described.insert(key.clone(), descriptor);
                }
                None => {
                    warn!(
                        hook = hook_name,
                        hook_id,
                        param = key.as_str(),
                        "Can't serialize hook parameter, page will not be cached"
                    );
                    self.valid = false;
                }
            }
        }

        self.hooks.push(HookDescriptor {
            section_id: section_id.clone(),
            hook_name: hook_name.to_string(),
            module_id,
            params: described,
        });

        section_id
    }

    // == Fresh Content ==
    /// Rebuilds the page with every dynamic section re-rendered.
    ///
    /// Sections are spliced in registration order, each into the content as
    /// updated by the previous ones. A section whose markers are missing is
    /// skipped. The stored content is never modified.
    pub fn get_fresh_content(
        &self,
        ctx: &Reconstruction<'_>,
        executor: &dyn HookExecutor,
        tokens: TokenProtection<'_>,
    ) -> Result<String> {
        let mut content = self.content.clone();

        for hook in &self.hooks {
            let params = hook
                .params
                .iter()
                .map(|(key, descriptor)| descriptor.reconstruct(ctx).map(|arg| (key.clone(), arg)))
                .collect::<Result<HookArgs>>()?;

            let section = executor
                .execute(&hook.hook_name, &params, hook.module_id)
                .map_err(|source| PageCacheError::Collaborator {
                    what: format!("hook {}", hook.hook_name),
                    source,
                })?;

            if let Some(updated) = splice_section(&content, &hook.section_id, &section) {
                content = updated;
            } else {
                debug!(section = hook.section_id.as_str(), "Section markers not found, skipping");
            }
        }

        if let TokenProtection::Enabled(generator) = tokens {
            content = rewrite_token(&content, &generator.generate());
        }

        Ok(content)
    }
}

/// Replaces the first marked block for `section_id`, markers included, with
/// `html`. Returns `None` when there is no such block.
fn splice_section(content: &str, section_id: &str, html: &str) -> Option<String> {
    let marker = regex::escape(&section_marker(section_id));
    let pattern = match Regex::new(&format!("(?s){}.*?{}", marker, marker)) {
        Ok(pattern) => pattern,
        Err(e) => {
            warn!(section = section_id, error = %e, "Invalid section pattern");
            return None;
        }
    };

    match pattern.replacen(content, 1, NoExpand(html)) {
        Cow::Owned(updated) => Some(updated),
        Cow::Borrowed(_) => None,
    }
}
