//! Error types for the workflow editor

use thiserror::Error;

use crate::validation::ValidationError;

/// Result type alias using EditorError
pub type Result<T> = std::result::Result<T, EditorError>;

/// Errors that can occur in the workflow editor
///
/// Stale references (an id that was deleted or edited away) are not errors;
/// topology operations report them as no-ops instead.
#[derive(Debug, Error)]
pub enum EditorError {
    /// A hydrated workflow does not form an editable graph
    #[error("Invalid workflow graph: {}", format_problems(.0))]
    InvalidGraph(Vec<ValidationError>),

    /// Configuration could not be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    /// Create an invalid configuration error with a message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

fn format_problems(problems: &[ValidationError]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
