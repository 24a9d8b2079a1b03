//! Engine configuration surface

use filemap_fs::{MemoryStore, StorageKind};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Recognized engine options.
///
/// Defaults: flat storage, empty files are written rather than unlinked.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Selects the file-handle factory strategy.
    pub storage: StorageKind,
    /// Whether an empty formatted result deletes the file instead of
    /// writing it.
    pub unlink_empty_files: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOptions {
    #[serde(default = "default_storage")]
    storage: String,
    #[serde(default)]
    unlink_empty_files: bool,
}

fn default_storage() -> String {
    "flat".to_string()
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage(mut self, storage: StorageKind) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_unlink_empty_files(mut self, unlink: bool) -> Self {
        self.unlink_empty_files = unlink;
        self
    }

    /// Parse options from TOML.
    ///
    /// Recognized keys: `storage` ("flat" or "memory") and
    /// `unlink_empty_files`.
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawOptions = toml::from_str(content)
            .map_err(|e| Error::configuration(format!("invalid engine options: {e}")))?;

        let storage = match raw.storage.as_str() {
            "flat" => StorageKind::Flat,
            "memory" => StorageKind::Memory(MemoryStore::new()),
            other => {
                return Err(Error::configuration(format!(
                    "unknown storage kind: {other}"
                )));
            }
        };

        Ok(Self {
            storage,
            unlink_empty_files: raw.unlink_empty_files,
        })
    }
}
