use serde::Serialize;
use thiserror::Error;

/// Failures surfaced by the deck store and the session backend.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Not signed in")]
    Unauthenticated,

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Backend unavailable: {0}")]
    Transient(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Unauthenticated,
    Validation,
    Conflict,
    Transient,
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::NotFound(_) => ErrorKind::NotFound,
            GatewayError::Unauthenticated => ErrorKind::Unauthenticated,
            GatewayError::Validation(_) => ErrorKind::Validation,
            GatewayError::Conflict(_) => ErrorKind::Conflict,
            GatewayError::Transient(_) => ErrorKind::Transient,
        }
    }
}

// Storage failures carry no specific code, so they surface as transient.
impl From<rusqlite::Error> for GatewayError {
    fn from(err: rusqlite::Error) -> Self {
        GatewayError::Transient(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
