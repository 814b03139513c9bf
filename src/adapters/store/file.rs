//! File-based Key-Value Store Adapter
//!
//! Stores each key as one file under a base directory. Writes go to a
//! temporary file first and are renamed into place, so a crash never leaves
//! a half-written record behind.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::fs;

use crate::ports::{KeyValueStore, StoreError};

/// File-based durable store.
#[derive(Debug)]
pub struct FileKeyValueStore {
    base_path: PathBuf,
    closed: AtomicBool,
}

impl FileKeyValueStore {
    /// Opens (and creates if needed) a store rooted at `base_path`.
    ///
    /// # Example
    /// ```ignore
    /// let store = FileKeyValueStore::open("/var/lib/roomwatch").await?;
    /// ```
    pub async fn open<P: AsRef<Path>>(base_path: P) -> Result<Self, StoreError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(Self {
            base_path,
            closed: AtomicBool::new(false),
        })
    }

    /// Path of the file that holds `key`.
    fn entry_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", encode_key(key)))
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

/// Maps a key to a file name. Bytes outside `[A-Za-z0-9_-]` are written as
/// `%XX` so distinct keys never share a file.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' => encoded.push(byte as char),
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.ensure_open()?;

        match fs::read(self.entry_path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.ensure_open()?;

        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, value)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
