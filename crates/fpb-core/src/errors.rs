use crate::domain::RecordId;

/// Core error type for the finance bot.
///
/// Adapter crates should map their specific errors into this type so the bot
/// core can handle failures consistently (user-facing message vs internal).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Pagination(#[from] PaginationError),

    #[error("record {0} not found")]
    NotFound(RecordId),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Invalid user input during data entry. The message is shown to the user verbatim.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    #[error("page {page} does not exist (total pages: {total_pages})")]
    OutOfRange { page: usize, total_pages: usize },

    #[error("page size must be positive, got {0}")]
    InvalidPageSize(usize),
}

impl Error {
    /// Text shown to the user when a handler fails.
    ///
    /// Storage and transport details are only exposed when `debug` is set.
    pub fn user_message(&self, debug: bool) -> String {
        match self {
            Error::Validation(e) => format!("❌ Invalid input: {}", e.message()),
            Error::Pagination(PaginationError::OutOfRange { .. }) => {
                "❌ There are no more pages.".to_string()
            }
            Error::NotFound(id) => format!("❌ Record #{id} not found."),
            Error::Unauthorized(_) => "❌ Access denied.".to_string(),
            other if debug => format!("❌ Error: {other}"),
            _ => "❌ Something went wrong while accessing your data. Try again later.".to_string(),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Pagination(_) | Error::NotFound(_)
        )
    }
}
