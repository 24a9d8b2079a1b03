//! Desired resources: the externally supplied target state

use serde_json::Value;

use crate::record::{AttrMap, Ensure, RecordId};

/// One resource the host wants reconciled against disk.
///
/// Prefetch assigns the matching on-disk record (or a synthesized absent
/// one) to the `provider` slot; the host then drives mutations through the
/// engine using that id.
#[derive(Debug, Clone)]
pub struct DesiredResource {
    name: String,
    ensure: Ensure,
    values: AttrMap,
    provider: Option<RecordId>,
}

impl DesiredResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ensure: Ensure::Present,
            values: AttrMap::new(),
            provider: None,
        }
    }

    pub fn with_ensure(mut self, ensure: Ensure) -> Self {
        self.ensure = ensure;
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Identity key of this resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ensure(&self) -> Ensure {
        self.ensure
    }

    /// Desired value for an attribute, if the host supplied one.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Record assigned by prefetch, if any.
    pub fn provider(&self) -> Option<RecordId> {
        self.provider
    }

    pub fn set_provider(&mut self, id: RecordId) {
        self.provider = Some(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_builder_defaults() {
        let resource = DesiredResource::new("web01");
        assert_eq!(resource.name(), "web01");
        assert_eq!(resource.ensure(), Ensure::Present);
        assert_eq!(resource.provider(), None);
        assert_eq!(resource.value("address"), None);
    }

    #[test]
    fn test_builder_values() {
        let resource = DesiredResource::new("web01")
            .with_ensure(Ensure::Absent)
            .with_value("address", json!("10.0.0.1"));

        assert_eq!(resource.ensure(), Ensure::Absent);
        assert_eq!(resource.value("address"), Some(&json!("10.0.0.1")));
    }
}
