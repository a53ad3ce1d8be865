//! Persistent key-value cache for store snapshots.
//!
//! The cache is a passive string store: the product store serializes its
//! whole collection into one blob under one key (see
//! [`DEFAULT_CACHE_KEY`]) and reads it back at startup.
//!
//! # Implementations
//!
//! - [`FileCache`] - one file per key in a directory; survives restarts
//! - [`MemoryCache`] - process-scoped, backed by `moka`

mod file;
mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

use async_trait::async_trait;

use crate::error::CacheError;

/// Storage key of the product snapshot.
pub const DEFAULT_CACHE_KEY: &str = "productsData";

/// Durable string storage addressed by key.
#[async_trait]
pub trait PersistentCache: Send + Sync {
    /// Read the value under `key`; `None` if nothing was ever stored.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, overwriting unconditionally.
    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

/// Reject keys that cannot double as a file name.
pub(crate) fn validate_key(key: &str) -> Result<(), CacheError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key(DEFAULT_CACHE_KEY).is_ok());
        assert!(validate_key("products-v2.backup_1").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("a/b").is_err());
    }
}
