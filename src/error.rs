use thiserror::Error;

/// Errors raised by the storage engines.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Unknown class: {0}")]
    UnknownClass(String),

    /// A record points at a row that does not exist (strict backends only).
    #[error("{class} not found: {id}")]
    MissingReference { class: String, id: String },

    #[error("Corrupt record {key}: {message}")]
    Corrupt { key: String, message: String },
}

pub type Result<T> = std::result::Result<T, StorageError>;
