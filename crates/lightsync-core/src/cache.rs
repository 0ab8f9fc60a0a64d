// ── Local key/value cache ──
//
// Durable storage for the metadata corpus and its version hash. Every
// failure in here degrades to a cache miss: callers never see an error,
// only a log line and the default value.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::CacheLocation;
use crate::error::CoreError;

/// Key holding the last metadata hash reported by the server.
pub const HASH_KEY: &str = "things_hash";
/// Key holding the per-thing metadata map.
pub const META_KEY: &str = "things_meta";

// ── Backends ─────────────────────────────────────────────────────────

/// Raw string storage behind a [`LocalCache`].
///
/// Implementations must make `write` atomic: a reader sees either the old
/// value or the new one, never a partial write.
pub trait CacheBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), CoreError>;
    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

impl<B: CacheBackend + ?Sized> CacheBackend for std::sync::Arc<B> {
    fn read(&self, key: &str) -> Result<Option<String>, CoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CoreError> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        (**self).remove(key)
    }
}

/// One JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Backend rooted at the platform cache directory.
    pub fn platform() -> Result<Self, CoreError> {
        let dirs = ProjectDirs::from("", "", "lightsync").ok_or_else(|| CoreError::Cache {
            message: "no home directory to place the cache in".into(),
        })?;
        Ok(Self::new(dirs.cache_dir()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_error(action: &str, path: &Path, err: &io::Error) -> CoreError {
    CoreError::Cache {
        message: format!("{action} {}: {err}", path.display()),
    }
}

impl CacheBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, CoreError> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("cannot read", &path, &e)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| io_error("cannot create", &self.dir, &e))?;

        // Write next to the target then rename over it.
        let path = self.path(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).map_err(|e| io_error("cannot write", &tmp, &e))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            io_error("cannot replace", &path, &e)
        })
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("cannot remove", &path, &e)),
        }
    }
}

/// Process-local storage. Used by tests and `--no-cache`.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, CoreError> {
        self.entries
            .lock()
            .map_err(|_| CoreError::Internal("memory cache lock poisoned".into()))
    }
}

impl CacheBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.lock()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// ── Cache envelope ───────────────────────────────────────────────────

/// What a hash-aware save actually persists: the payload tagged with the
/// hash that was current when it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: Option<String>,
    pub payload: Value,
}

// ── LocalCache ───────────────────────────────────────────────────────

/// Key/value cache with plain and hash-aware access.
pub struct LocalCache {
    backend: Box<dyn CacheBackend>,
    /// Serializes read-modify-write merges of hash-aware maps.
    merge_lock: Mutex<()>,
}

impl std::fmt::Debug for LocalCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCache").finish_non_exhaustive()
    }
}

impl LocalCache {
    /// A cache whose hash-aware entries are paired with [`HASH_KEY`].
    pub fn new(backend: impl CacheBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            merge_lock: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Open the cache described by `location`.
    ///
    /// If the platform directory can't be determined the cache falls back
    /// to memory: a missing cache only costs refetches.
    pub fn open(location: &CacheLocation) -> Self {
        match location {
            CacheLocation::Memory => Self::in_memory(),
            CacheLocation::Dir(dir) => Self::new(FileBackend::new(dir)),
            CacheLocation::Platform => match FileBackend::platform() {
                Ok(backend) => {
                    debug!(dir = %backend.dir().display(), "using platform cache directory");
                    Self::new(backend)
                }
                Err(e) => {
                    warn!(error = %e, "falling back to in-memory cache");
                    Self::in_memory()
                }
            },
        }
    }

    // ── Plain access ─────────────────────────────────────────────────

    /// Stored value for `key`, or `default` if absent or unreadable.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.load(key).unwrap_or(default)
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "cache value not serializable, skipping save");
                return;
            }
        };
        if let Err(e) = self.backend.write(key, &raw) {
            warn!(key, error = %e, "cache save failed");
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            warn!(key, error = %e, "cache remove failed");
        }
    }

    // ── Hash-aware access ────────────────────────────────────────────

    /// The payload under `key`, only if it was saved while the currently
    /// stored hash was in effect.
    pub fn cache_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry: CacheEntry = self.load(key)?;
        let current = self.stored_hash();
        if current.is_none() || entry.hash != current {
            debug!(key, "cache entry is stale");
            return None;
        }
        match serde_json::from_value(entry.payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "cache payload has unexpected shape, treating as miss");
                None
            }
        }
    }

    /// Save `value` under `key`, tagged with the currently stored hash.
    pub fn cache_save<T: Serialize>(&self, key: &str, value: &T) {
        let payload = match serde_json::to_value(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "cache value not serializable, skipping save");
                return;
            }
        };
        let entry = CacheEntry {
            hash: self.stored_hash(),
            payload,
        };
        self.save(key, &entry);
    }

    /// Merge `fetched` into the hash-aware map under `key`, moving the
    /// stored hash to `hash` first. A changed hash orphans the old map, so
    /// the merge starts from empty. Concurrent merges never lose entries.
    pub fn merge_hashed<V>(&self, key: &str, hash: &str, fetched: &HashMap<String, V>)
    where
        V: Serialize + DeserializeOwned + Clone,
    {
        let _guard = self.merge_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.stored_hash().as_deref() != Some(hash) {
            self.save_hash(hash);
        }
        let mut persisted: HashMap<String, V> = self.cache_get(key).unwrap_or_default();
        persisted.extend(fetched.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.cache_save(key, &persisted);
    }

    /// The hash paired with hash-aware entries.
    pub fn stored_hash(&self) -> Option<String> {
        self.load(HASH_KEY)
    }

    pub fn save_hash(&self, hash: &str) {
        self.save(HASH_KEY, &hash);
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.read(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "cache entry corrupt, treating as miss");
                None
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
