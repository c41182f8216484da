#![warn(missing_docs)]
//! # courier-core
//!
//! Core types for the courier request pipeline.
//!
//! Callers describe an API call as a [`Target`]. For every request the
//! pipeline derives an [`Endpoint`] from it, lets the prepare hook and
//! middlewares adjust it, and hands it to a backend which encodes it with
//! [`ParameterEncoding`] and performs it. The backend reports exactly one
//! `Result<Response, Error>` through a [`Completion`].
//!
//! This crate holds the pieces shared by every backend:
//!
//! - **Describe** a call ([`Target`], [`Parameters`], [`ParameterValue`])
//! - **Encode** it into a wire-ready request ([`ParameterEncoding`], [`EncodedRequest`])
//! - **Carry** it through the pipeline ([`Endpoint`])
//! - **Report** the outcome ([`Response`], [`Error`])
//! - **Arbitrate** cancellation against delivery ([`CancellationToken`], [`CompletionSlot`])
//! - **Declare** canned responses for stub backends ([`StubResponse`])

pub mod cancel;
pub mod completion;
pub mod encoding;
pub mod endpoint;
pub mod error;
pub mod parameter;
pub mod response;
pub mod sample;
pub mod target;

pub use cancel::{CancellationToken, TokenState};
pub use completion::{Completion, CompletionSlot};
pub use encoding::{
    CustomEncoding, EncodedRequest, EncodingOptions, MultipartStream, ParameterEncoding,
    RequestBody,
};
pub use endpoint::Endpoint;
pub use error::{BoxError, Error, SharedError};
pub use parameter::{
    MultipartPayload, ParameterValue, Parameters, PayloadReader, PayloadSource, PayloadStream,
    parameters,
};
pub use response::{Response, ResponseClass, UnexpectedStatus};
pub use sample::StubResponse;
pub use target::Target;

/// Result type delivered to every completion.
pub type RequestResult = Result<Response, Error>;

#[doc(hidden)]
pub use http::{HeaderMap, HeaderValue, Method};
#[doc(hidden)]
pub use url::Url;
