//! Cache Module
//!
//! Full-page cache entries whose dynamic hook sections are re-rendered on
//! every serve.

mod codec;
mod entry;
mod hook;
mod param;
mod stats;
mod store;
mod token;

#[cfg(test)]
mod property_tests;
#[cfg(test)]
mod testing;

// Re-export public types
pub use entry::{HookExecutor, PageCacheEntry};
pub use hook::{section_marker, wrap_section, HookDescriptor, ModuleId, SECTION_PREFIX};
pub use param::{
    AmbientHandle, AmbientObject, EntityLoader, HookArg, HookArgs, LanguageId, ParamDescriptor,
    PersistentEntity, ProductCatalog, ProductRow, Reconstruction, RequestContext,
};
pub use stats::PageCacheStats;
pub use store::{MemoryPageStore, PageCache, PageStore};
pub use token::{rewrite_token, TokenGenerator, TokenProtection};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed serialized entry size in bytes
pub const MAX_ENTRY_SIZE: usize = 4 * 1024 * 1024; // 4 MB
