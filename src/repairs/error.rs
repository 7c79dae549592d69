use thiserror::Error;

use super::policy::Operation;

/// Failures reported by a `TicketRepository` or `PrincipalResolver`.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),
}

/// Errors surfaced by `TicketService` operations.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Path, query, or body that could not be decoded; carries the decoder's explanation.
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("authentication required")]
    Unauthenticated,
    #[error("{} requires a staff account", .0.as_str())]
    Forbidden(Operation),
    #[error("repository failure")]
    Repository(#[from] RepositoryError),
}

impl TicketError {
    /// Stable machine-readable kind used in error payloads.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) | Self::MalformedRequest(_) => "invalid_input",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::Repository(_) => "repository_failure",
        }
    }
}

impl From<sqlx::Error> for TicketError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}
