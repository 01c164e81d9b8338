//! Error types for the import run and the target store.

use thiserror::Error;

/// Failures raised by the persistence gateway.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration error: {0}")]
    Migration(#[from] refinery::Error),

    #[error("database connection lock poisoned")]
    LockPoisoned,

    /// Stored data that cannot be interpreted, e.g. a non-numeric sequence number.
    #[error("corrupt stored data: {0}")]
    Corrupt(String),
}

/// Fatal conditions that abort an import run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid expiry date '{value}'")]
    InvalidDate { line: usize, value: String },

    #[error("license {license}: stored description has no '{marker}' marker")]
    TemplateMismatch { license: String, marker: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Input line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            ImportError::MalformedRow { line, .. } | ImportError::InvalidDate { line, .. } => {
                Some(*line)
            }
            _ => None,
        }
    }
}

/// Result type for gateway operations.
pub type StoreResult<T> = std::result::Result<T, StorageError>;

/// Result type for import operations.
pub type ImportResult<T> = std::result::Result<T, ImportError>;
