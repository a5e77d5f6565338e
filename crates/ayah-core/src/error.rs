use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Resource corrupt: {0}")]
    ResourceCorrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Client-side mistakes; everything else is reported as an internal failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidRequest(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
