//! Error types for filemap-core

/// Result type for filemap-core operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] filemap_fs::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Contract violation in {context}: expected {expected}, got {actual}")]
    Contract {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("Record id {id} is not registered in the instance directory")]
    UnknownRecord { id: usize },
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn contract(
        context: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Contract {
            context: context.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Human-readable name for a JSON value's type, used in contract violations.
pub(crate) fn value_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
