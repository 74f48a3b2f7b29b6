//! Minimal JSON-file key/value store.
//!
//! The whole file is one JSON object mapping record names to values.
//! Every write goes to a sibling temp file that is then renamed over the
//! original, so readers see either the old or the new file and never a
//! partial one. Writers inside this process are serialised by a mutex.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Serialises read-modify-write cycles within the process.
static WRITE_LOCK: Mutex<()> = Mutex::new(());

/// A key/value store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct KvStore {
    path: PathBuf,
}

impl KvStore {
    /// Store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read one record. A missing file reads as an empty store.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut map = self.read_map()?;
        Ok(map.remove(key))
    }

    /// Replace one record with `value`.
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = WRITE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map_or_empty();
        map.insert(key.to_string(), value);
        self.write_map(&map)
    }

    /// Remove one record. Unreadable files are replaced by an empty store.
    pub fn delete(&self, key: &str) -> Result<()> {
        let _guard = WRITE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.path.exists() {
            return Ok(());
        }
        let mut map = self.read_map_or_empty();
        map.remove(key);
        self.write_map(&map)
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {} as a JSON object", self.path.display()))
    }

    fn read_map_or_empty(&self) -> Map<String, Value> {
        self.read_map().unwrap_or_else(|e| {
            log::warn!("[Store] Replacing unreadable store file: {e:#}");
            Map::new()
        })
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create store directory {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(map).context("Failed to serialize store")?;
        let tmp_path = self.temp_path();
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))
                .context("Failed to set store file permissions")?;
        }

        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!("Failed to move store file into place at {}", self.path.display())
        })?;

        log::debug!("[Store] Wrote {:?}", self.path);
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".tmp-{}", std::process::id()));
        self.path.with_file_name(name)
    }
}
