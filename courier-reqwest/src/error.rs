//! Errors raised while constructing a [`ReqwestBackend`](crate::ReqwestBackend).

use thiserror::Error;

/// Backend construction failure.
#[derive(Debug, Error)]
pub enum ReqwestBackendError {
    /// No runtime handle was given and none was current.
    #[error("no tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    /// The reqwest client could not be built from the configuration.
    #[error("failed to build reqwest client: {0}")]
    Client(#[from] reqwest::Error),
}
