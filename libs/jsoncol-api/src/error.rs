use std::fmt;

/// Error kind for conversion errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Model-build time: missing converter, type mismatch, missing hook.
    Config,
    /// Value could not be encoded as JSON (e.g. map with non-string keys).
    Serialization,
    /// Stored column is not valid JSON or does not match the target type.
    Deserialization,
    /// Row shape does not match the entity map.
    Schema,
}

/// Conversion error — returned by converters, codecs and generated row code.
#[derive(Debug)]
pub struct ConvertError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ConvertError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Serialization, message: msg.into() }
    }

    pub fn deserialization(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Deserialization, message: msg.into() }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Schema, message: msg.into() }
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }

    pub fn is_config(&self) -> bool {
        self.kind == ErrorKind::Config
    }

    pub fn is_deserialization(&self) -> bool {
        self.kind == ErrorKind::Deserialization
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ConvertError {}

// ---------------------------------------------------------------------------
// From impls: serde_json errors → ConvertError
// ---------------------------------------------------------------------------

/// Decoding is the only path that relies on `?` over serde_json errors.
/// Encoding paths map their errors with `ConvertError::serialization`.
impl From<serde_json::Error> for ConvertError {
    fn from(e: serde_json::Error) -> Self {
        Self::deserialization(e.to_string())
    }
}
