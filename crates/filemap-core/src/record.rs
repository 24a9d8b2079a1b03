//! Provider records and their attribute maps

use std::collections::BTreeMap;

use serde_json::Value;

/// Attribute map backing a record: property/parameter name to value.
pub type AttrMap = BTreeMap<String, Value>;

/// Whether a record should exist in (`Present`) or be removed from
/// (`Absent`) its backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensure {
    Present,
    Absent,
}

/// Handle to a record registered in the engine's instance directory.
///
/// Ids are only meaningful to the engine that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(pub(crate) usize);

impl RecordId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// In-memory representation of one resource instance tied to a backing
/// file.
///
/// Records are never physically deleted: destruction sets the ensure state
/// to [`Ensure::Absent`] and the record stays resident until a flush drops
/// it from the file's formatted output.
#[derive(Debug, Clone)]
pub struct ProviderRecord {
    name: String,
    kind: String,
    ensure: Ensure,
    attributes: AttrMap,
}

impl ProviderRecord {
    pub(crate) fn new(name: impl Into<String>, kind: impl Into<String>, ensure: Ensure) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ensure,
            attributes: AttrMap::new(),
        }
    }

    pub(crate) fn with_attributes(mut self, attributes: AttrMap) -> Self {
        self.attributes = attributes;
        self
    }

    /// Identity key of this record.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag of the provider kind that constructed this record.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn ensure(&self) -> Ensure {
        self.ensure
    }

    /// Whether the record should exist in its backing file.
    pub fn exists(&self) -> bool {
        self.ensure == Ensure::Present
    }

    /// Stored value for an attribute; `None` means unset.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &AttrMap {
        &self.attributes
    }

    pub(crate) fn set_value(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
    }

    pub(crate) fn set_ensure(&mut self, ensure: Ensure) {
        self.ensure = ensure;
    }
}
