use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Failures of the remote document service. These never escape the
/// service boundary as panics; callers get them as values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("API key not configured")]
    NotConfigured,

    /// Nothing has been pushed yet. Not fatal.
    #[error("No bin ID stored")]
    NoDocumentId,

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Remote rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed remote document: {0}")]
    Malformed(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;
