use amagi_common::{EventEmitter, Result, SearchResult};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::cache::{Cache, CacheKind};

/// Volatile cache, lost when the process exits.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, SearchResult>>,
    events: EventEmitter,
}

impl MemoryCache {
    pub fn new(events: EventEmitter) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            events,
        }
    }
}

impl Cache for MemoryCache {
    fn kind(&self) -> CacheKind {
        CacheKind::Memory
    }

    fn get(&self, key: &str) -> Option<SearchResult> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: SearchResult) -> Result<()> {
        self.entries.write().insert(key.to_string(), value);
        self.events.debug(format!("Cache set: {}", key));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let old = std::mem::take(&mut *self.entries.write());
        drop(old);
        Ok(())
    }

    fn total(&self) -> usize {
        self.entries.read().len()
    }
}
