use amagi_common::{Result, SearchResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which backend a [`Cache`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    /// Process-lifetime map.
    #[default]
    Memory,
    /// Map mirrored to a JSON file on every write.
    Storage,
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKind::Memory => f.write_str("memory"),
            CacheKind::Storage => f.write_str("storage"),
        }
    }
}

/// Lookup key to search result store.
///
/// Entries never expire individually; [`clear`](Cache::clear) drops all of
/// them at once.
pub trait Cache: Send + Sync {
    fn kind(&self) -> CacheKind;

    fn get(&self, key: &str) -> Option<SearchResult>;

    /// Stores `value` under `key`. The value is readable afterwards even when
    /// an error is returned; errors only report failed persistence.
    fn set(&self, key: &str, value: SearchResult) -> Result<()>;

    fn delete(&self, key: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;

    fn total(&self) -> usize;
}
