//! Canned responses for stub backends.

use bytes::Bytes;

use crate::error::SharedError;

/// Outcome a stub backend delivers for a request.
#[derive(Debug, Clone)]
pub enum StubResponse {
    /// A response with status code and body.
    NetworkResponse(u16, Bytes),
    /// A transport failure; delivered as
    /// [`Error::TransportFailed`](crate::Error::TransportFailed).
    NetworkError(SharedError),
    /// The request is deliberately left unstubbed.
    NoRuleError,
}

impl StubResponse {
    /// Shorthand for [`StubResponse::NetworkResponse`].
    pub fn network_response(status_code: u16, body: impl Into<Bytes>) -> Self {
        Self::NetworkResponse(status_code, body.into())
    }

    /// Shorthand for [`StubResponse::NetworkError`].
    pub fn network_error(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::NetworkError(SharedError::new(error))
    }
}
