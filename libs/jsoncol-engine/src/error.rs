use jsoncol_api::error::{ConvertError, ErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("property '{property}' not found on entity '{entity}'")]
    PropertyNotFound { entity: String, property: String },

    #[error(
        "converter for {actual} cannot be registered on {entity}.{property} (declared type {expected})"
    )]
    TypeMismatch {
        entity: String,
        property: String,
        expected: String,
        actual: String,
    },

    #[error("{entity}.{property} has no storage mapping (declared type {type_name}); is the json scan missing?")]
    Unmapped {
        entity: String,
        property: String,
        type_name: String,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// For `Convert` variant, context is added to the inner `ConvertError`.
    /// For `Config`, `EntityNotFound` and `Io`, context is prepended to the
    /// message; `Io` keeps its `ErrorKind`.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Convert(e) => EngineError::Convert(e.with_context(ctx)),
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            EngineError::EntityNotFound(msg) => {
                EngineError::EntityNotFound(format!("{ctx}: {msg}"))
            }
            EngineError::Io(e) => {
                EngineError::Io(std::io::Error::new(e.kind(), format!("{ctx}: {e}")))
            }
            other => other,
        }
    }

    /// Model-build time failure: bad configuration or model shape.
    pub fn is_config(&self) -> bool {
        match self {
            EngineError::Config(_)
            | EngineError::EntityNotFound(_)
            | EngineError::PropertyNotFound { .. }
            | EngineError::TypeMismatch { .. }
            | EngineError::Unmapped { .. } => true,
            EngineError::Convert(e) => e.kind == ErrorKind::Config,
            EngineError::Io(_) => false,
        }
    }

    /// Row materialization failure: stored text is not the declared type.
    pub fn is_deserialization(&self) -> bool {
        matches!(self, EngineError::Convert(e) if e.kind == ErrorKind::Deserialization)
    }
}
