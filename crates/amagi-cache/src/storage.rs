use amagi_common::{AmagiError, EventEmitter, Result, SearchResult};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::cache::{Cache, CacheKind};

/// Durable cache.
///
/// Reads are served from an in-memory view. Every mutation rewrites the whole
/// JSON document next to `path` and renames it into place, so a crash never
/// leaves a half-written file behind. Mutations block on disk I/O, so async
/// callers should run them on the blocking pool.
pub struct StorageCache {
    path: PathBuf,
    entries: RwLock<HashMap<String, SearchResult>>,
    /// Serializes file writes. Each writer snapshots the view while holding
    /// it, so the newest state always lands last.
    write_lock: Mutex<()>,
    events: EventEmitter,
}

impl StorageCache {
    /// Opens the cache stored at `path`, starting empty when the file does
    /// not exist yet.
    pub fn open(path: impl Into<PathBuf>, events: EventEmitter) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), "Discarding unreadable cache file: {}", e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(AmagiError::Io(e)),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
            write_lock: Mutex::new(()),
            events,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        let body = {
            let entries = self.entries.read();
            serde_json::to_vec(&*entries)?
        };

        self.write_atomically(&body).map_err(|e| {
            AmagiError::Persistence(format!("{}: {}", self.path.display(), e))
        })
    }

    fn write_atomically(&self, body: &[u8]) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(body)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Cache for StorageCache {
    fn kind(&self) -> CacheKind {
        CacheKind::Storage
    }

    fn get(&self, key: &str) -> Option<SearchResult> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: SearchResult) -> Result<()> {
        self.entries.write().insert(key.to_string(), value);
        let persisted = self.persist();
        self.events.debug(format!("Cache set: {}", key));
        persisted
    }

    fn delete(&self, key: &str) -> Result<()> {
        let removed = self.entries.write().remove(key);
        if removed.is_some() {
            self.persist()?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let old = std::mem::take(&mut *self.entries.write());
        if old.is_empty() {
            return Ok(());
        }
        drop(old);
        self.persist()
    }

    fn total(&self) -> usize {
        self.entries.read().len()
    }
}
