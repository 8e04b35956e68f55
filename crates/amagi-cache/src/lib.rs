//! Amagi Result Cache
//!
//! Search results are cached by lookup key (`ytsearch:<query>` or a raw URL)
//! in front of the node pool so repeated searches never reach the network.
//!
//! # Backends
//!
//! - [`MemoryCache`]: process-lifetime map
//! - [`StorageCache`]: map mirrored to a JSON file, rewritten atomically on
//!   every mutation
//!
//! Both implement [`Cache`]; [`CacheManager`] picks one from [`CacheConfig`]
//! and, when a positive timeout is configured, runs a tokio task that clears
//! the whole cache on every tick. There is no per-entry expiry.
//!
//! # Example
//!
//! ```
//! use amagi_cache::{CacheConfig, CacheManager};
//! use amagi_common::{EventEmitter, LoadType, SearchResult};
//!
//! let manager = CacheManager::new(CacheConfig::memory(), EventEmitter::new()).unwrap();
//! let result = SearchResult::new(LoadType::NoMatches, vec![]);
//! manager.cache().set("ytsearch:lofi", result).unwrap();
//! assert_eq!(manager.total(), 1);
//! ```

mod cache;
mod manager;
mod memory;
mod storage;

pub use cache::{Cache, CacheKind};
pub use manager::{CacheConfig, CacheManager, DEFAULT_STORAGE_PATH};
pub use memory::MemoryCache;
pub use storage::StorageCache;
