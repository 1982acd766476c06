//! Error types for legalaider-core

use thiserror::Error;

/// Main error type for the legalaider-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// LLM transport or protocol error
    #[error("LLM error: {0}")]
    Llm(String),

    /// The text-generation collaborator returned output that does not match
    /// the expected cluster shape
    #[error("{kind} clustering returned malformed output: {message}")]
    ClusteringFormat { kind: String, message: String },

    /// A record reached report assembly without time savings
    #[error("conversation {0} is missing time savings data; run analysis first")]
    MissingTimeSavings(String),

    /// A collaborator call exceeded its time budget
    #[error("{operation} timed out after {timeout_ms}ms")]
    CollaboratorTimeout { operation: String, timeout_ms: u64 },

    /// Update referenced a conversation that does not exist
    #[error("conversation not found: {id} in {category}")]
    NotFound { category: String, id: String },
}

/// Result type alias for legalaider-core
pub type Result<T> = std::result::Result<T, Error>;
