#![allow(dead_code)]
//! Shared fixture provider for the engine integration tests
//!
//! Speaks a trivial `name=value` line format so round trips are real
//! parse/format work rather than canned strings, and records every hook
//! invocation so ordering and exactly-once properties are assertable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use filemap_core::{Error, FileProvider, ProviderRecord, Result};
use serde_json::{Value, json};

/// How `parse_file` misbehaves, for contract-violation tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseShape {
    /// Well-formed: one object per `name=value` line.
    KeyValue,
    /// Returns an object instead of an array.
    NotAnArray,
    /// Returns an array containing a bare string.
    RowNotObject,
    /// Returns rows without the identity attribute.
    MissingIdentity,
}

pub struct FixtureProvider {
    targets: Vec<PathBuf>,
    routes: HashMap<String, PathBuf>,
    default_route: PathBuf,
    shape: ParseShape,
    format_nonstring: bool,
    pre_flush_fails: bool,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FixtureProvider {
    pub fn new(targets: Vec<PathBuf>) -> Self {
        let default_route = targets
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("/fixture/flush"));
        Self {
            targets,
            routes: HashMap::new(),
            default_route,
            shape: ParseShape::KeyValue,
            format_nonstring: false,
            pre_flush_fails: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Route records with this identity to a specific file.
    pub fn route(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.routes.insert(name.to_string(), path.into());
        self
    }

    pub fn with_default_route(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_route = path.into();
        self
    }

    pub fn with_shape(mut self, shape: ParseShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_nonstring_format(mut self) -> Self {
        self.format_nonstring = true;
        self
    }

    pub fn with_failing_pre_flush(mut self) -> Self {
        self.pre_flush_fails = true;
        self
    }

    /// Formatter and hook invocations observed so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl FileProvider for FixtureProvider {
    fn kind(&self) -> &str {
        "fixture"
    }

    fn properties(&self) -> &[&str] {
        &["value"]
    }

    fn parameters(&self) -> &[&str] {
        &["note"]
    }

    fn target_files(&self) -> Vec<PathBuf> {
        self.targets.clone()
    }

    fn parse_file(&self, _path: &Path, content: &str) -> Result<Value> {
        match self.shape {
            ParseShape::KeyValue => {
                let rows: Vec<Value> = content
                    .lines()
                    .filter_map(|line| line.split_once('='))
                    .map(|(k, v)| json!({ "name": k.trim(), "value": v.trim() }))
                    .collect();
                Ok(Value::Array(rows))
            }
            ParseShape::NotAnArray => Ok(json!({ "oops": true })),
            ParseShape::RowNotObject => Ok(json!(["not an object"])),
            ParseShape::MissingIdentity => Ok(json!([{ "value": "orphan" }])),
        }
    }

    fn format_file(&self, path: &Path, records: &[&ProviderRecord]) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("format:{}", path.display()));
        if self.format_nonstring {
            return Ok(json!(["definitely", "not", "a", "string"]));
        }
        let mut lines: Vec<String> = records
            .iter()
            .map(|r| {
                format!(
                    "{}={}",
                    r.name(),
                    r.get("value").and_then(Value::as_str).unwrap_or("")
                )
            })
            .collect();
        lines.sort();
        let mut out = lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        Ok(Value::String(out))
    }

    fn select_file(&self, record: &ProviderRecord) -> PathBuf {
        self.routes
            .get(record.name())
            .cloned()
            .unwrap_or_else(|| self.default_route.clone())
    }

    fn pre_flush(&self, path: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(format!("pre:{}", path.display()));
        if self.pre_flush_fails {
            return Err(Error::configuration("pre-flush hook rejected the write"));
        }
        Ok(())
    }

    fn post_flush(&self, path: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(format!("post:{}", path.display()));
        Ok(())
    }
}
