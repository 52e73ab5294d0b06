//! Error types for Easel operations

use serde::{Deserialize, Serialize};

use crate::eval::EngineError;

/// Result type for Easel operations
pub type Result<T> = std::result::Result<T, EaselError>;

/// Error types for the Easel harness
#[derive(Debug, thiserror::Error)]
pub enum EaselError {
    /// Failure raised by the workflow engine, propagated unchanged
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Model provider or network failure
    #[error("Model error: {0}")]
    Model(String),

    /// Judge output does not conform to the declared schema
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    /// Expected sub-field absent from a node result or case input
    #[error("Shape error: {0}")]
    Shape(String),

    /// Dataset could not be loaded or a case is unusable for the requested mode
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl EaselError {
    /// Classification used when a failure is recorded instead of raised
    pub fn kind(&self) -> ErrorKind {
        match self {
            EaselError::Engine(EngineError::NodeNotFound(_)) => ErrorKind::NodeNotFound,
            EaselError::Engine(EngineError::Model(_)) | EaselError::Model(_) => ErrorKind::Model,
            EaselError::Engine(EngineError::Timeout(_)) => ErrorKind::Timeout,
            EaselError::SchemaValidation(_) => ErrorKind::SchemaValidation,
            EaselError::Shape(_) => ErrorKind::Shape,
            EaselError::Dataset(_) => ErrorKind::Dataset,
            _ => ErrorKind::Other,
        }
    }
}

/// Error classification carried by recorded failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NodeNotFound,
    Model,
    Timeout,
    SchemaValidation,
    Shape,
    Dataset,
    Other,
}

impl From<String> for EaselError {
    fn from(s: String) -> Self {
        EaselError::Other(s)
    }
}

impl From<&str> for EaselError {
    fn from(s: &str) -> Self {
        EaselError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for EaselError {
    fn from(err: anyhow::Error) -> Self {
        EaselError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_keep_their_classification() {
        let err: EaselError = EngineError::NodeNotFound("generatePath".into()).into();
        assert_eq!(err.kind(), ErrorKind::NodeNotFound);
        assert_eq!(err.to_string(), "Node not found: generatePath");

        let err: EaselError = EngineError::Timeout("60s elapsed".into()).into();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn model_failures_share_a_kind() {
        let from_engine: EaselError = EngineError::Model("rate limited".into()).into();
        let from_judge = EaselError::Model("connection reset".into());
        assert_eq!(from_engine.kind(), ErrorKind::Model);
        assert_eq!(from_judge.kind(), ErrorKind::Model);
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::SchemaValidation).unwrap();
        assert_eq!(json, "\"schema_validation\"");
    }
}
