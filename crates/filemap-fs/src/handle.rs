//! FileHandle trait, concrete handles, and the storage-kind factory
//!
//! A handle owns the raw read/write/backup mechanics for exactly one backing
//! file. The engine never touches the filesystem directly; it asks the
//! factory for a handle and works through this trait.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{Error, Result};
use crate::io;

/// Raw access to one backing file.
///
/// `backup` is an optional capability: callers must check
/// `supports_backup()` before invoking it.
pub trait FileHandle: Send {
    /// The path this handle is bound to.
    fn path(&self) -> &Path;

    /// Read the full content. A file that does not exist yet reads as "".
    fn read(&self) -> Result<String>;

    /// Replace the full content.
    fn write(&mut self, content: &str) -> Result<()>;

    /// Whether the backing file currently exists.
    fn exists(&self) -> bool;

    /// Remove the backing file.
    fn remove(&mut self) -> Result<()>;

    /// Whether this handle can take backups.
    fn supports_backup(&self) -> bool {
        false
    }

    /// Take a backup of the current content.
    fn backup(&self) -> Result<()> {
        Err(Error::BackupUnsupported {
            path: self.path().to_path_buf(),
        })
    }
}

/// Handle for a flat file on durable storage.
///
/// Writes are atomic (temp file + rename) and a sibling `.bak` copy is taken
/// on backup.
pub struct FlatHandle {
    path: PathBuf,
}

impl FlatHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".bak");
        PathBuf::from(name)
    }
}

impl FileHandle for FlatHandle {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        io::read_text_or_empty(&self.path)
    }

    fn write(&mut self, content: &str) -> Result<()> {
        io::write_atomic(&self.path, content.as_bytes())
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn remove(&mut self) -> Result<()> {
        fs::remove_file(&self.path).map_err(|e| Error::io(&self.path, e))
    }

    fn supports_backup(&self) -> bool {
        true
    }

    fn backup(&self) -> Result<()> {
        if !self.path.exists() {
            // Nothing to preserve yet
            return Ok(());
        }
        let dest = self.backup_path();
        fs::copy(&self.path, &dest).map_err(|e| Error::io(&dest, e))?;
        debug!(path = %self.path.display(), backup = %dest.display(), "backed up file");
        Ok(())
    }
}

#[derive(Default)]
struct MemoryInner {
    files: HashMap<PathBuf, String>,
    writes: Vec<PathBuf>,
}

/// Shared in-process file store backing `MemoryHandle`s.
///
/// Cloning yields another view of the same store, so a test (or a host
/// staging changes without touching disk) can seed content and observe
/// writes made through handles created by the factory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed content for a path.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.inner
            .lock()
            .expect("memory store lock poisoned")
            .files
            .insert(path.into(), content.into());
    }

    /// Current content for a path, if any.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.inner
            .lock()
            .expect("memory store lock poisoned")
            .files
            .get(path.as_ref())
            .cloned()
    }

    /// How many writes have been performed against a path.
    pub fn write_count(&self, path: impl AsRef<Path>) -> usize {
        self.inner
            .lock()
            .expect("memory store lock poisoned")
            .writes
            .iter()
            .filter(|p| p.as_path() == path.as_ref())
            .count()
    }

    fn read(&self, path: &Path) -> String {
        self.inner
            .lock()
            .expect("memory store lock poisoned")
            .files
            .get(path)
            .cloned()
            .unwrap_or_default()
    }

    fn write(&self, path: &Path, content: &str) {
        let mut inner = self.inner.lock().expect("memory store lock poisoned");
        inner.files.insert(path.to_path_buf(), content.to_string());
        inner.writes.push(path.to_path_buf());
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner
            .lock()
            .expect("memory store lock poisoned")
            .files
            .contains_key(path)
    }

    fn remove(&self, path: &Path) {
        self.inner
            .lock()
            .expect("memory store lock poisoned")
            .files
            .remove(path);
    }
}

/// Handle bound to a `MemoryStore` entry. Does not support backup.
pub struct MemoryHandle {
    path: PathBuf,
    store: MemoryStore,
}

impl MemoryHandle {
    pub fn new(path: impl Into<PathBuf>, store: MemoryStore) -> Self {
        Self {
            path: path.into(),
            store,
        }
    }
}

impl FileHandle for MemoryHandle {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        Ok(self.store.read(&self.path))
    }

    fn write(&mut self, content: &str) -> Result<()> {
        self.store.write(&self.path, content);
        Ok(())
    }

    fn exists(&self) -> bool {
        self.store.exists(&self.path)
    }

    fn remove(&mut self) -> Result<()> {
        self.store.remove(&self.path);
        Ok(())
    }
}

/// Selects which handle implementation the factory produces.
#[derive(Clone, Default)]
pub enum StorageKind {
    /// Real files with atomic writes and `.bak` backups.
    #[default]
    Flat,
    /// In-process store, primarily for tests and dry staging.
    Memory(MemoryStore),
}

impl StorageKind {
    pub fn name(&self) -> &'static str {
        match self {
            StorageKind::Flat => "flat",
            StorageKind::Memory(_) => "memory",
        }
    }
}

impl std::fmt::Debug for StorageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Create a handle for `path` appropriate to the configured storage kind.
pub fn create_handle(kind: &StorageKind, path: &Path) -> Box<dyn FileHandle> {
    match kind {
        StorageKind::Flat => Box::new(FlatHandle::new(path)),
        StorageKind::Memory(store) => Box::new(MemoryHandle::new(path, store.clone())),
    }
}
