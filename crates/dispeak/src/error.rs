use std::any::Any;

use dispeak_core::MalformedVersionError;
use dispeak_platform::AppPathsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to resolve application paths: {0}")]
    Paths(#[from] AppPathsError),
    #[error("failed to create data directory: {0}")]
    DataDir(#[source] std::io::Error),
    #[error("running version is invalid: {0}")]
    Version(#[from] MalformedVersionError),
    #[error("failed to create HTTP client: {0}")]
    HttpClient(String),
    #[error("{0}")]
    Unhandled(String),
}

impl AppError {
    /// Turn a caught panic payload into an advisory error.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::Unhandled(message)
    }
}
