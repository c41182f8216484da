//! Error taxonomy for requests.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Boxed, thread-safe error used for opaque causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Terminal failure of a request.
///
/// Exactly one variant wraps any failing completion. Middlewares observe it
/// but never rewrite it.
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be built, e.g. parameters failed to encode.
    #[error("failed to build request: {0}")]
    BuildRequestFailed(#[source] BoxError),

    /// Transport-level failure: timeout, DNS, connection reset and the like.
    #[error("transport failed: {0}")]
    TransportFailed(#[source] BoxError),

    /// The backend produced neither a response nor a proper error.
    ///
    /// This is a backend contract violation and is kept apart from both
    /// success and ordinary transport failure.
    #[error("unexpected transport outcome: {0}")]
    UnexpectedTransport(#[source] BoxError),

    /// The request was cancelled before a definitive result was claimed.
    #[error("request cancelled")]
    Cancelled,

    /// The request was short-circuited by the prepare hook or a middleware.
    #[error("request aborted before dispatch")]
    Aborted,

    /// Opaque passthrough of an external error.
    #[error(transparent)]
    Underlying(BoxError),
}

impl Error {
    /// Wraps an encoding failure.
    pub fn build_request(error: impl Into<BoxError>) -> Self {
        Self::BuildRequestFailed(error.into())
    }

    /// Wraps a transport failure.
    pub fn transport(error: impl Into<BoxError>) -> Self {
        Self::TransportFailed(error.into())
    }

    /// Wraps a backend contract violation.
    pub fn unexpected(error: impl Into<BoxError>) -> Self {
        Self::UnexpectedTransport(error.into())
    }

    /// Wraps any other error.
    pub fn underlying(error: impl Into<BoxError>) -> Self {
        Self::Underlying(error.into())
    }

    /// Returns `true` for [`Error::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` for [`Error::Aborted`].
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

/// A reference-counted error that can be handed out more than once.
///
/// Stub responses are cloned for every request they answer, so the error
/// they carry is shared rather than owned.
#[derive(Clone)]
pub struct SharedError(Arc<dyn std::error::Error + Send + Sync>);

impl SharedError {
    /// Wraps an error.
    pub fn new(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(error))
    }

    /// Returns the wrapped error.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.0
    }
}

impl From<BoxError> for SharedError {
    fn from(error: BoxError) -> Self {
        Self(Arc::from(error))
    }
}

impl fmt::Debug for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for SharedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl std::error::Error for SharedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}
