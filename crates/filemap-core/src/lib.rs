//! Reconciliation engine for file-backed resource records.
//!
//! This crate keeps an in-memory set of declarative resource records
//! synchronized with one or more backing flat-text files. A concrete
//! provider implements [`FileProvider`] to describe which files it owns,
//! how their text parses into attribute maps, and how records format back
//! into text; the [`SyncEngine`] owns everything generic: reading files
//! into records on demand, tracking which files have unwritten changes,
//! aggregating the records destined for one file, and flushing only what
//! changed, exactly once, with backup and optional removal of files that
//! become empty.
//!
//! # Architecture
//!
//! - [`FileRegistry`] maps each backing file to its dirty flag and its
//!   lazily created handle.
//! - [`SyncEngine::instances`] loads records from disk and registers them
//!   in the instance directory.
//! - [`SyncEngine::prefetch`] matches desired resources to on-disk records
//!   by identity, synthesizing an absent record where nothing matched.
//! - Mutations funnel through the engine so the owning file is marked
//!   dirty; [`SyncEngine::flush_file`] writes a dirtied file back out.
//!
//! The engine is fully synchronous and single-threaded by design: one
//! failed load or flush poisons the engine and every later flush is
//! refused until the host starts a fresh pass.

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod provider;
pub mod record;
pub mod registry;
pub mod resource;

pub use config::EngineOptions;
pub use engine::SyncEngine;
pub use error::{Error, Result};
pub use provider::FileProvider;
pub use record::{AttrMap, Ensure, ProviderRecord, RecordId};
pub use registry::FileRegistry;
pub use resource::DesiredResource;
