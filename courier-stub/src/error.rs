//! Errors produced by the stub backend.

use courier_core::{Method, Url};
use thiserror::Error;

/// A request reached the stub backend with no rule, no target sample and no
/// default response.
///
/// Only delivered under [`UnmatchedStubPolicy::Error`](crate::UnmatchedStubPolicy::Error),
/// wrapped in [`Error::Underlying`](courier_core::Error::Underlying).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{method} {url} is not stubbed yet")]
pub struct UnstubbedRequest {
    /// Request method.
    pub method: Method,
    /// Request URL.
    pub url: Url,
}
