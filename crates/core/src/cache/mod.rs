//! Local durable cache used as a first-paint hint.
//!
//! The cache is never authoritative. Everything written here has already been
//! written to (or read from) the document store.

pub mod file;
pub mod memory;

use thiserror::Error;

pub use file::FileCache;
pub use memory::MemoryCache;

/// Last successfully loaded site configuration, serialized as JSON.
pub const CONFIG_KEY: &str = "site_config";
/// Last-known owner uid. A local development override, not a credential.
pub const OWNER_KEY: &str = "site_owner";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cached value is not valid: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Synchronous key-value store. Every call may fail.
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    fn remove(&self, key: &str) -> Result<(), CacheError>;
}
