//! Persistent key/value storage
//!
//! The native counterpart of `localStorage`: a flat JSON object on disk.
//! Values are JSON, so a stored string round-trips as a string.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::constants::config;

#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl Storage {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::STORAGE_FILENAME);
        path
    }

    /// Open a storage file. Missing or unreadable files start empty
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<Map<String, Value>>(&contents)
                .inspect_err(|e| warn!(path = %path.display(), error = %e, "Storage error, starting empty"))
                .unwrap_or_default(),
            Err(_) => Map::new(),
        };
        debug!(path = %path.display(), keys = entries.len(), "opened storage");
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.entries.insert(key.to_string(), value.into());
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.flush()?;
        }
        Ok(removed)
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create storage directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize storage")?;
        fs::write(&self.path, json)
            .context(format!("Failed to write storage file {}", self.path.display()))
    }
}
