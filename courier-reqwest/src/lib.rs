#![warn(missing_docs)]
//! reqwest transport for courier.
//!
//! [`ReqwestBackend`] encodes each endpoint with its parameter encoding,
//! sends it with a [`reqwest::Client`] on a tokio runtime and reports the
//! outcome through the completion:
//!
//! | outcome | result |
//! |---------|--------|
//! | any HTTP response | `Ok(Response)` |
//! | encoding or request builder failure | [`Error::BuildRequestFailed`](courier_core::Error::BuildRequestFailed) |
//! | timeout, connect, request, body, decode or redirect failure | [`Error::TransportFailed`](courier_core::Error::TransportFailed) |
//! | panicked transport task, unclassified reqwest error | [`Error::UnexpectedTransport`](courier_core::Error::UnexpectedTransport) |
//! | cancelled token | [`Error::Cancelled`](courier_core::Error::Cancelled) |
//!
//! ```no_run
//! use courier_reqwest::ReqwestBackend;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), courier_reqwest::ReqwestBackendError> {
//! let backend = ReqwestBackend::builder().build()?;
//! # Ok(())
//! # }
//! ```

mod backend;
pub mod config;
pub mod error;

pub use backend::{ReqwestBackend, ReqwestBackendBuilder};
pub use config::ReqwestBackendConfig;
pub use error::ReqwestBackendError;
