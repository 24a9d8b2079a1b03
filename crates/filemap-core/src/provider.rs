//! FileProvider trait: the capability contract a concrete provider implements

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::Result;
use crate::record::ProviderRecord;

/// Contract between the engine and a concrete provider kind.
///
/// A provider describes which files it owns, how their text parses into
/// attribute maps, and how records format back into text. The engine owns
/// everything else: caching, dirty tracking, and the flush sequence.
///
/// `parse_file` and `format_file` exchange dynamic [`Value`] payloads so
/// the engine, not each provider, owns shape validation: a parser must
/// produce an array of objects and a formatter must produce a string, and
/// the engine rejects anything else before it reaches the write path.
pub trait FileProvider {
    /// Tag identifying this provider kind (e.g. "hosts", "interfaces").
    fn kind(&self) -> &str;

    /// Name of the identity attribute in parsed rows.
    ///
    /// Composite identity keys are not supported; the single attribute
    /// named here keys the prefetch match.
    fn namevar(&self) -> &str {
        "name"
    }

    /// Declared property names. Writes to these mark the owning file
    /// dirty.
    fn properties(&self) -> &[&str];

    /// Declared parameter names. Writes to these are stored but never
    /// dirty a file.
    fn parameters(&self) -> &[&str] {
        &[]
    }

    /// Every file this provider kind reads records from.
    fn target_files(&self) -> Vec<PathBuf>;

    /// Parse one file's content into an array of attribute-map objects.
    fn parse_file(&self, path: &Path, content: &str) -> Result<Value>;

    /// Format the records destined for one file back into its full text
    /// content, returned as a string value.
    fn format_file(&self, path: &Path, records: &[&ProviderRecord]) -> Result<Value>;

    /// The file a record belongs to. Resolved on every use, never cached.
    fn select_file(&self, record: &ProviderRecord) -> PathBuf;

    /// Invoked just before a file's content is written or removed.
    fn pre_flush(&self, _path: &Path) -> Result<()> {
        Ok(())
    }

    /// Invoked after the write/removal attempt, whether or not it
    /// succeeded.
    fn post_flush(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
