#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! # courier
//!
//! A transport-agnostic HTTP request pipeline.
//!
//! Describe each API call as a [`Target`], send it through a [`Provider`],
//! and get exactly one `Result<Response, Error>` back, either through a
//! completion callback or as a future. The transport is a pluggable
//! [`Backend`]: `courier-reqwest` talks to real servers, `courier-stub`
//! answers from canned responses with controllable timing.
//!
//! ```
//! use std::borrow::Cow;
//!
//! use courier::prelude::*;
//! use courier_stub::StubBackend;
//!
//! struct Zen;
//!
//! impl Target for Zen {
//!     fn base_url(&self) -> Url {
//!         Url::parse("https://api.github.com").unwrap()
//!     }
//!
//!     fn path(&self) -> Cow<'_, str> {
//!         Cow::Borrowed("/zen")
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let stubs = StubBackend::new();
//! stubs.stub(&Zen, StubResponse::network_response(200, "Design for failure."));
//!
//! let provider = Provider::new(stubs);
//! let response = provider.send(Zen).await.unwrap();
//! assert_eq!(response.map_string().unwrap(), "Design for failure.");
//! # }
//! ```

/// Future returned by [`Provider::send`].
pub mod future;

/// Middleware trait and the built-in middlewares.
pub mod middleware;

/// The provider and its builder.
pub mod provider;

pub use future::ResponseFuture;
pub use middleware::Middleware;
pub use provider::{NotSet, PrepareHook, Provider, ProviderBuilder};

pub use courier_backend::{Backend, BackendLabel};
pub use courier_core::{
    CancellationToken, Completion, CustomEncoding, Endpoint, Error, MultipartPayload,
    ParameterEncoding, ParameterValue, Parameters, Response, ResponseClass, StubResponse, Target,
    TokenState, parameters,
};

/// Everything needed to declare targets and send requests.
pub mod prelude {
    pub use crate::middleware::{Middleware, NetworkActivityMiddleware, NetworkLoggerMiddleware};
    pub use crate::{Provider, ResponseFuture};
    pub use courier_backend::Backend;
    pub use courier_core::{
        CancellationToken, Endpoint, Error, HeaderMap, HeaderValue, Method, ParameterEncoding,
        ParameterValue, Parameters, Response, StubResponse, Target, Url, parameters,
    };
}
