//! Asynchronous key/value store capability.
//!
//! Two key families are used: [`META_KEY`] for the structured document
//! record and `"img:" + page_id` for raw image payloads, kept apart so
//! metadata-only edits never rewrite large binaries.
//!
//! Operations on independent keys may run concurrently. Callers serialize
//! operations on the same key by awaiting each before issuing the next.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::persist::error::StoreError;

/// Key of the structured metadata record.
pub const META_KEY: &str = "meta";

/// Prefix of image payload keys.
pub const IMAGE_KEY_PREFIX: &str = "img:";

/// Store key for a page's image payload.
pub fn image_key(page_id: &str) -> String {
    format!("{}{}", IMAGE_KEY_PREFIX, page_id)
}

/// Asynchronous byte store. Every operation may fail.
pub trait BlobStore {
    /// Read a value; `Ok(None)` if the key is absent.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>>;

    /// Insert or overwrite a value.
    fn set(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<(), StoreError>>;

    /// Remove a value. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>>;

    /// Remove every value.
    fn clear_all(&self) -> impl Future<Output = Result<(), StoreError>>;

    /// Every key currently present, sorted.
    fn list_keys(&self) -> impl Future<Output = Result<Vec<String>, StoreError>>;
}

/// In-process store, used by hosts without persistent storage and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Whether `key` holds a value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// Sorted snapshot of the keys.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl BlobStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.borrow_mut().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        self.entries.borrow_mut().clear();
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.keys())
    }
}

/// Escape a page id into a file stem. ASCII alphanumerics, `-` and `_` pass
/// through; every other byte becomes `~XX` (uppercase hex), so the stem never
/// contains a separator or `.` and distinct ids never share a file.
fn escape_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("~{:02X}", byte));
        }
    }
    out
}

/// Inverse of [`escape_id`]. `None` for stems this store did not write.
fn unescape_id(stem: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(stem.len());
    let mut rest = stem.as_bytes();
    while let Some((&first, tail)) = rest.split_first() {
        if first == b'~' {
            let hex = std::str::from_utf8(tail.get(..2)?).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            rest = &tail[2..];
        } else {
            bytes.push(first);
            rest = tail;
        }
    }
    String::from_utf8(bytes).ok()
}

/// Directory-backed store: one file per key.
///
/// `meta` is stored as `meta.json`; `img:<id>` as `img/<id>.bin`, with the
/// id escaped so any page id maps to a single file inside the root.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store under the platform's local data directory.
    pub fn default_location() -> Option<Self> {
        dirs::data_local_dir().map(|dir| Self::new(dir.join("memomo").join("store")))
    }

    /// Directory holding the records.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key == META_KEY {
            return Ok(self.root.join("meta.json"));
        }
        let Some(id) = key.strip_prefix(IMAGE_KEY_PREFIX) else {
            return Err(StoreError::InvalidKey(key.to_string()));
        };
        if id.is_empty() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.images_dir().join(format!("{}.bin", escape_id(id))))
    }

    fn images_dir(&self) -> PathBuf {
        self.root.join("img")
    }
}

impl BlobStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write-then-rename so a crash never leaves a torn record.
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, &value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        if self.root.join("meta.json").is_file() {
            keys.push(META_KEY.to_string());
        }
        let entries = match std::fs::read_dir(self.images_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("bin") {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(unescape_id)
            else {
                log::debug!("Skipping foreign file {:?}", path);
                continue;
            };
            keys.push(image_key(&id));
        }
        keys.sort();
        Ok(keys)
    }
}
