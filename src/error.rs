// Copyright 2026 Remi Bernotavicius

pub type Result<T> = std::result::Result<T, Error>;

/// Service failures the API boundary maps to client-facing responses.
/// Everything except `Database`, `Render`, and `Io` is a client error.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Authorization(String),

    #[error("authentication required")]
    AuthenticationRequired,

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("document rendering failed: {0}")]
    Render(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization(message.into())
    }

    /// True for failures caused by the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Conflict(_)
                | Self::NotFound(_)
                | Self::Authorization(_)
                | Self::AuthenticationRequired
        )
    }
}
