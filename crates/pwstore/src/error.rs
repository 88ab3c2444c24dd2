//! Error types for pwstore.
//!
//! All errors are strongly typed and propagated without panicking.
//! Field values and decrypted plaintext are never included in error messages.

/// Store error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid record name: {0:?}")]
    InvalidName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Record {record} is the target of aliases: {}", aliases.join(", "))]
    Aliased {
        record: String,
        aliases: Vec<String>,
    },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),

    #[error("Commit integrity check failed: {0}")]
    Commit(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<git2::Error> for StoreError {
    fn from(e: git2::Error) -> Self {
        StoreError::Repository(e.message().to_string())
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, StoreError>;
