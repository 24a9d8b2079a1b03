//! File-handle abstraction for the filemap engine
//!
//! Provides the `FileHandle` trait consumed by the reconciliation engine,
//! concrete flat-file and in-memory handles, and the storage-kind factory
//! that selects between them.

pub mod error;
pub mod handle;
pub mod io;

pub use error::{Error, Result};
pub use handle::{FileHandle, FlatHandle, MemoryHandle, MemoryStore, StorageKind, create_handle};
