//! Persisted key/value settings.
//!
//! The engine reads and writes a single string (the comment template) through
//! [`SettingsStore`]. `MemorySettings` backs tests and embedding; `FileSettings`
//! persists a flat TOML table next to the project.

use std::path::PathBuf;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::core::errors::EngineError;

/// Get/set of string values with a caller-supplied fallback.
pub trait SettingsStore: Send + Sync {
    /// Stored value for `key`, or `default` when unset.
    fn get(&self, key: &str, default: &str) -> String;

    fn set(&self, key: &str, value: &str) -> Result<(), EngineError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<IndexMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str, default: &str) -> String {
        self.values.read().get(key).cloned().unwrap_or_else(|| default.to_string())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), EngineError> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// TOML-file store; every `set` rewrites the file atomically.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    cache: MemorySettings,
}

impl FileSettings {
    /// Load `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        let cache = MemorySettings::new();

        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let table: IndexMap<String, String> = toml::from_str(&text)
                    .map_err(|source| EngineError::SettingsDecode { path: path.clone(), source })?;
                *cache.values.write() = table;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file yet");
            }
            Err(source) => return Err(EngineError::SettingsIo { path, source }),
        }
        Ok(Self { path, cache })
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str, default: &str) -> String {
        self.cache.get(key, default)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), EngineError> {
        // Serialize under the write lock so concurrent sets cannot interleave
        let mut values = self.cache.values.write();
        let mut next = values.clone();
        next.insert(key.to_string(), value.to_string());

        let text = toml::to_string_pretty(&next)?;
        crate::infra::io::write_atomic(&self.path, text.as_bytes()).map_err(|e| {
            EngineError::SettingsIo {
                path: self.path.clone(),
                source: std::io::Error::other(format!("{e:#}")),
            }
        })?;
        *values = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_falls_back_to_default() {
        let store = MemorySettings::new();
        assert_eq!(store.get("k", "d"), "d");
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k", "d"), "v");
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".argnote/settings.toml");

        let store = FileSettings::open(&path).unwrap();
        assert_eq!(store.get("DEFAULT_COMMENT_FORMAT", "/* %s= */"), "/* %s= */");
        store.set("DEFAULT_COMMENT_FORMAT", "/* %s: */").unwrap();

        let reopened = FileSettings::open(&path).unwrap();
        assert_eq!(reopened.get("DEFAULT_COMMENT_FORMAT", ""), "/* %s: */");
    }

    #[test]
    fn corrupt_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        let err = FileSettings::open(&path).unwrap_err();
        assert!(matches!(err, EngineError::SettingsDecode { .. }));
    }
}
