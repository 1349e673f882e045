//! Common error types and handling for Linecard

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Linecard data-access layer
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),

    /// A store round-trip failed. Never swallowed; if it happens inside a
    /// transaction scope, the whole transaction rolls back.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A precondition on an argument failed. Raised before any store call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A single-row-by-key lookup found nothing where a row was mandatory.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// A cancellation token was observed before or during a read.
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Whether the error was raised locally, before any store round-trip.
    pub fn is_local(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::Cancelled)
    }

    /// Get the error code for logs and reports
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Unexpected(_) => "UNEXPECTED_ERROR",
            Error::Database(_) => "DATABASE_ERROR",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::MissingData(_) => "MISSING_DATA",
            Error::Cancelled => "CANCELLED",
        }
    }
}
