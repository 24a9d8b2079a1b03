//! SyncEngine implementation
//!
//! The engine coordinates state between desired resources (what the host
//! wants) and backing flat files (what is on disk). One engine instance
//! exists per concrete provider kind; it owns the file registry, the
//! instance directory of every record ever constructed, the sticky failed
//! flag, and the configuration surface.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::EngineOptions;
use crate::error::{Error, Result, value_type_name};
use crate::provider::FileProvider;
use crate::record::{AttrMap, Ensure, ProviderRecord, RecordId};
use crate::registry::FileRegistry;
use crate::resource::DesiredResource;

/// Reconciliation engine for one provider kind.
///
/// The flush state machine per file is Clean → Dirty (on any mutation) →
/// Clean (on successful flush). Any error during load or flush moves the
/// whole engine into a terminal failed state: every later flush request is
/// refused with a logged warning until the host starts a fresh pass with a
/// new engine.
pub struct SyncEngine<P: FileProvider> {
    provider: P,
    options: EngineOptions,
    registry: FileRegistry,
    records: Vec<ProviderRecord>,
    failed: bool,
}

impl<P: FileProvider> SyncEngine<P> {
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, EngineOptions::default())
    }

    pub fn with_options(provider: P, options: EngineOptions) -> Self {
        Self {
            provider,
            options,
            registry: FileRegistry::new(),
            records: Vec::new(),
            failed: false,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Whether the engine has been poisoned by a failed load or flush.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Move the engine into the failed state. Sticky: there is no way
    /// back within the engine's lifetime.
    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// Every record registered in the instance directory so far.
    pub fn records(&self) -> &[ProviderRecord] {
        &self.records
    }

    pub fn record(&self, id: RecordId) -> Option<&ProviderRecord> {
        self.records.get(id.index())
    }

    fn record_mut(&mut self, id: RecordId) -> Result<&mut ProviderRecord> {
        self.records
            .get_mut(id.index())
            .ok_or(Error::UnknownRecord { id: id.index() })
    }

    /// Validate the provider's declared schema before any I/O.
    ///
    /// The capability surface itself (target files, parser, formatter,
    /// file selection) is enforced by the trait, so only the dynamic parts
    /// of the contract are checked here.
    fn validate_provider(&self) -> Result<()> {
        let namevar = self.provider.namevar();
        if namevar.is_empty() {
            return Err(Error::configuration(format!(
                "provider {} declares an empty identity attribute",
                self.provider.kind()
            )));
        }
        for reserved in [namevar, "ensure"] {
            if self.provider.properties().contains(&reserved) {
                return Err(Error::configuration(format!(
                    "provider {} declares `{reserved}` as a property; it is engine-managed",
                    self.provider.kind()
                )));
            }
        }
        Ok(())
    }

    /// Read every target file and return the parsed attribute maps, in
    /// target-file enumeration order.
    ///
    /// Any error past schema validation poisons the engine, the same as
    /// through `instances`.
    pub fn load_from_disk(&mut self) -> Result<Vec<AttrMap>> {
        self.validate_provider()?;
        match self.try_load() {
            Ok(rows) => Ok(rows),
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    fn try_load(&mut self) -> Result<Vec<AttrMap>> {
        let mut rows = Vec::new();
        for path in self.provider.target_files() {
            let content = self
                .registry
                .handle_for(&self.options.storage, &path)
                .read()?;

            let parsed = self.provider.parse_file(&path, &content)?;
            let context = format!("parse_file({})", path.display());
            let items = match parsed {
                Value::Array(items) => items,
                other => {
                    return Err(Error::contract(
                        context.clone(),
                        "an array of attribute maps",
                        value_type_name(&other),
                    ));
                }
            };
            for item in items {
                let map = match item {
                    Value::Object(map) => map,
                    other => {
                        return Err(Error::contract(
                            context.clone(),
                            "an attribute map",
                            value_type_name(&other),
                        ));
                    }
                };
                rows.push(map.into_iter().collect());
            }
        }
        Ok(rows)
    }

    /// Load all records from disk and register them in the instance
    /// directory.
    ///
    /// Every row gets `ensure = present` and the provider-kind tag. Any
    /// error past schema validation poisons the engine and propagates
    /// unchanged.
    pub fn instances(&mut self) -> Result<Vec<RecordId>> {
        self.validate_provider()?;
        match self.try_instances() {
            Ok(ids) => Ok(ids),
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    fn try_instances(&mut self) -> Result<Vec<RecordId>> {
        let rows = self.try_load()?;
        let namevar = self.provider.namevar().to_string();
        let kind = self.provider.kind().to_string();

        let mut ids = Vec::with_capacity(rows.len());
        for mut row in rows {
            let name = match row.remove(&namevar) {
                Some(Value::String(s)) => s,
                Some(other) => {
                    return Err(Error::contract(
                        format!("identity attribute `{namevar}`"),
                        "a string",
                        value_type_name(&other),
                    ));
                }
                None => {
                    return Err(Error::contract(
                        "parsed attribute map",
                        format!("a row containing the identity attribute `{namevar}`"),
                        "a row without it",
                    ));
                }
            };

            let record = ProviderRecord::new(name, kind.clone(), Ensure::Present).with_attributes(row);
            ids.push(self.register(record));
        }
        Ok(ids)
    }

    fn register(&mut self, record: ProviderRecord) -> RecordId {
        self.records.push(record);
        RecordId(self.records.len() - 1)
    }

    /// Match desired resources to on-disk records by identity.
    ///
    /// Resources with a matching record get it assigned to their provider
    /// slot; the rest get a freshly synthesized absent record, so every
    /// resource ends up with a well-defined "does not exist on disk"
    /// state.
    pub fn prefetch(&mut self, resources: &mut BTreeMap<String, DesiredResource>) -> Result<()> {
        let ids = self.instances()?;

        let mut by_name: HashMap<String, RecordId> = HashMap::with_capacity(ids.len());
        for id in ids {
            // A later record with the same identity wins
            by_name.insert(self.records[id.index()].name().to_string(), id);
        }

        for (name, resource) in resources.iter_mut() {
            if let Some(&id) = by_name.get(name) {
                resource.set_provider(id);
            }
        }

        for resource in resources.values_mut() {
            if resource.provider().is_none() {
                let record =
                    ProviderRecord::new(resource.name(), self.provider.kind(), Ensure::Absent);
                let id = self.register(record);
                resource.set_provider(id);
            }
        }

        Ok(())
    }

    /// Stored value for one record attribute; `None` means unset.
    pub fn get(&self, id: RecordId, key: &str) -> Option<&Value> {
        self.record(id).and_then(|r| r.get(key))
    }

    /// Whether a record should exist in its backing file.
    pub fn exists(&self, id: RecordId) -> bool {
        self.record(id).is_some_and(ProviderRecord::exists)
    }

    /// Copy every declared property the desired resource has a value for
    /// into the record, adopt its ensure state, and mark the owning file
    /// dirty.
    pub fn create(&mut self, id: RecordId, desired: &DesiredResource) -> Result<()> {
        let props: Vec<String> = self
            .provider
            .properties()
            .iter()
            .map(|p| p.to_string())
            .collect();

        let record = self.record_mut(id)?;
        for prop in &props {
            if let Some(value) = desired.value(prop) {
                record.set_value(prop.clone(), value.clone());
            }
        }
        record.set_ensure(desired.ensure());

        self.mark_record_dirty(id)
    }

    /// Representational destruction: the record stays resident with
    /// `ensure = absent` until a flush drops it from the file.
    pub fn destroy(&mut self, id: RecordId) -> Result<()> {
        self.record_mut(id)?.set_ensure(Ensure::Absent);
        self.mark_record_dirty(id)
    }

    /// Store a value on a record.
    ///
    /// Declared properties mark the owning file dirty; parameter writes
    /// are stored without dirtying anything.
    pub fn set(&mut self, id: RecordId, key: &str, value: Value) -> Result<()> {
        let is_property = self.provider.properties().contains(&key);
        self.record_mut(id)?.set_value(key, value);
        if is_property {
            self.mark_record_dirty(id)?;
        }
        Ok(())
    }

    /// Resolve the file a record belongs to and mark it dirty.
    pub fn mark_record_dirty(&mut self, id: RecordId) -> Result<()> {
        let record = self
            .records
            .get(id.index())
            .ok_or(Error::UnknownRecord { id: id.index() })?;
        let path = self.provider.select_file(record);
        self.registry.mark_dirty(&path);
        Ok(())
    }

    /// Mark a file dirty directly, creating its registry entry if needed.
    pub fn mark_file_dirty(&mut self, path: &Path) {
        self.registry.mark_dirty(path);
    }

    /// Whether a file has unwritten in-memory changes.
    pub fn is_dirty(&mut self, path: &Path) -> bool {
        self.registry.is_dirty(path)
    }

    /// All present records whose `select_file` resolves to `path`.
    ///
    /// Absent records are excluded here, so destroyed entries drop out of
    /// the formatted output without the formatter special-casing them.
    pub fn records_for_file(&self, path: &Path) -> Vec<&ProviderRecord> {
        self.records
            .iter()
            .filter(|r| r.exists() && self.provider.select_file(r).as_path() == path)
            .collect()
    }

    /// Flush the file one record belongs to.
    pub fn flush(&mut self, id: RecordId) -> Result<()> {
        let record = self
            .records
            .get(id.index())
            .ok_or(Error::UnknownRecord { id: id.index() })?;
        let path = self.provider.select_file(record);
        self.flush_file(&path)
    }

    /// Flush every file currently marked dirty.
    pub fn flush_all(&mut self) -> Result<()> {
        let paths: Vec<_> = self.registry.paths().map(Path::to_path_buf).collect();
        for path in paths {
            self.flush_file(&path)?;
        }
        Ok(())
    }

    /// Write one file back out if it is dirty.
    ///
    /// Sequence: collect present records, format, pre-flush hook, write
    /// (or backup-and-unlink when the content is empty and unlinking is
    /// configured), post-flush hook. The post-flush hook runs even when
    /// the write fails. Any error poisons the engine; a successful flush
    /// clears the dirty flag.
    pub fn flush_file(&mut self, path: &Path) -> Result<()> {
        if self.failed {
            warn!(path = %path.display(), "engine previously failed, refusing to flush");
            return Ok(());
        }
        if !self.registry.is_dirty(path) {
            debug!(path = %path.display(), "file is clean, nothing to flush");
            return Ok(());
        }

        match self.try_flush(path) {
            Ok(()) => {
                self.registry.clear_dirty(path);
                Ok(())
            }
            Err(e) => {
                self.failed = true;
                Err(e)
            }
        }
    }

    fn try_flush(&mut self, path: &Path) -> Result<()> {
        let content = {
            let records = self.records_for_file(path);
            let formatted = self.provider.format_file(path, &records)?;
            match formatted {
                Value::String(s) => s,
                other => {
                    return Err(Error::contract(
                        format!("format_file({})", path.display()),
                        "a string",
                        value_type_name(&other),
                    ));
                }
            }
        };

        // The post-flush hook must run whether or not the write path
        // succeeded, so the result is captured rather than propagated.
        let result = match self.provider.pre_flush(path) {
            Ok(()) => self.write_or_unlink(path, &content),
            Err(e) => Err(e),
        };
        let post = self.provider.post_flush(path);

        result?;
        post
    }

    fn write_or_unlink(&mut self, path: &Path, content: &str) -> Result<()> {
        let handle = self.registry.handle_for(&self.options.storage, path);

        if content.is_empty() && self.options.unlink_empty_files {
            if handle.exists() {
                if handle.supports_backup() {
                    handle.backup()?;
                }
                handle.remove()?;
                debug!(path = %path.display(), "removed empty backing file");
            }
            return Ok(());
        }

        if handle.supports_backup() {
            handle.backup()?;
        }
        handle.write(content)?;
        debug!(path = %path.display(), bytes = content.len(), "flushed backing file");
        Ok(())
    }
}
