//! Per-request descriptor derived from a [`Target`].

use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, Method};
use tracing::trace;
use url::Url;

use crate::encoding::{EncodedRequest, EncodingOptions, ParameterEncoding};
use crate::error::Error;
use crate::parameter::Parameters;
use crate::target::Target;

/// Mutable snapshot of a [`Target`] for one request.
///
/// Each request owns its endpoint exclusively. The prepare hook and the
/// middlewares adjust it in place; the backend finally consumes it.
///
/// The URL and method are fixed by the target. Headers, parameters, the
/// parameter encoding and the [`should_perform`](Endpoint::should_perform)
/// flag can be changed.
#[derive(Clone)]
pub struct Endpoint {
    target: Arc<dyn Target>,
    url: Url,
    method: Method,
    headers: HeaderMap,
    parameters: Parameters,
    parameter_encoding: ParameterEncoding,
    should_perform: bool,
}

impl Endpoint {
    /// Snapshots `target`.
    pub fn new(target: Arc<dyn Target>) -> Self {
        Self {
            url: target.full_url(),
            method: target.method(),
            headers: target.headers(),
            parameters: target.parameters(),
            parameter_encoding: target.parameter_encoding(),
            should_perform: true,
            target,
        }
    }

    /// Originating target.
    pub fn target(&self) -> &Arc<dyn Target> {
        &self.target
    }

    /// Request URL before parameter encoding.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Header fields.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable header fields.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Parameters.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Mutable parameters.
    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    /// Parameter encoding.
    pub fn parameter_encoding(&self) -> &ParameterEncoding {
        &self.parameter_encoding
    }

    /// Replaces the parameter encoding.
    pub fn set_parameter_encoding(&mut self, encoding: ParameterEncoding) {
        self.parameter_encoding = encoding;
    }

    /// `false` once the request was aborted before dispatch.
    pub fn should_perform(&self) -> bool {
        self.should_perform
    }

    /// Sets the abort flag.
    pub fn set_should_perform(&mut self, should_perform: bool) {
        self.should_perform = should_perform;
    }

    /// Marks the request as aborted. The backend will not be called.
    pub fn abort(&mut self) {
        self.should_perform = false;
    }

    /// Encodes the endpoint into a wire-ready request.
    pub fn encode(&self, options: &EncodingOptions) -> Result<EncodedRequest, Error> {
        trace!(
            method = %self.method,
            url = %self.url,
            encoding = ?self.parameter_encoding,
            parameters = self.parameters.len(),
            "encoding endpoint"
        );
        let request =
            EncodedRequest::new(self.url.clone(), self.method.clone(), self.headers.clone());
        self.parameter_encoding
            .encode(request, &self.parameters, options)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("parameters", &self.parameters)
            .field("parameter_encoding", &self.parameter_encoding)
            .field("should_perform", &self.should_perform)
            .finish_non_exhaustive()
    }
}
