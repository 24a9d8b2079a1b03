//! Backing file registry: dirty flags and lazily created handles

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use filemap_fs::{FileHandle, StorageKind, create_handle};
use tracing::debug;

/// Per-file state tracked by the registry.
pub struct MappedFile {
    dirty: bool,
    handle: Option<Box<dyn FileHandle>>,
}

impl MappedFile {
    fn new() -> Self {
        Self {
            dirty: false,
            handle: None,
        }
    }
}

/// Maps each backing file path to its dirty flag and its handle.
///
/// Entries are created on first access with a clean flag and no handle, so
/// an unseen path is indistinguishable from a clean one. A handle is
/// created at most once per path, and only when a read or write actually
/// needs it.
#[derive(Default)]
pub struct FileRegistry {
    files: BTreeMap<PathBuf, MappedFile>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, path: &Path) -> &mut MappedFile {
        self.files
            .entry(path.to_path_buf())
            .or_insert_with(MappedFile::new)
    }

    /// Mark a file as having unwritten in-memory changes.
    pub fn mark_dirty(&mut self, path: &Path) {
        self.entry(path).dirty = true;
    }

    /// Whether a file has unwritten in-memory changes.
    pub fn is_dirty(&mut self, path: &Path) -> bool {
        self.entry(path).dirty
    }

    /// Clear the dirty flag after a successful flush.
    pub fn clear_dirty(&mut self, path: &Path) {
        self.entry(path).dirty = false;
    }

    /// Handle for a path, created through the factory on first need.
    pub fn handle_for(&mut self, kind: &StorageKind, path: &Path) -> &mut Box<dyn FileHandle> {
        let entry = self.entry(path);
        entry.handle.get_or_insert_with(|| {
            debug!(path = %path.display(), storage = kind.name(), "creating file handle");
            create_handle(kind, path)
        })
    }

    /// Paths the registry has seen so far.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }
}
