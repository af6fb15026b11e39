//! Unified error types for ee-draws.
//!
//! The display prefix of each variant is a stable code that ends up in the
//! run log, so a failed run can be grepped by category.

use tokio_rusqlite::rusqlite;

/// Unified error type for fetching, extraction and persistence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Robots.txt disallowed access.
    #[error("ROBOTS_DISALLOWED: {0}")]
    RobotsDisallowed(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// HTTP error response or network failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// A block matched a marker but its value could not be read, or the page
    /// is missing a required field.
    #[error("EXTRACT_FAILED: {0}")]
    ExtractFailed(String),

    /// The parallel attribute sequences of the history page disagree in length.
    #[error(
        "EXTRACTION_ALIGNMENT: rounds={rounds} scores={scores} invitations={invitations} scopes={scopes}"
    )]
    ExtractionAlignment { rounds: usize, scores: usize, invitations: usize, scopes: usize },

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A persisted row could not be mapped back to a domain value.
    #[error("STORE_ERROR: corrupt row: {0}")]
    CorruptRow(String),
}

impl Error {
    /// Whether this error belongs to the page retrieval family.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            Error::InvalidUrl(_)
                | Error::RobotsDisallowed(_)
                | Error::FetchTimeout(_)
                | Error::FetchTooLarge(_)
                | Error::HttpError(_)
        )
    }

    /// Whether this error belongs to the persistence family.
    pub fn is_store(&self) -> bool {
        matches!(self, Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptRow(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
