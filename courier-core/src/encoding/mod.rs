//! Parameter encoding.
//!
//! Turns an endpoint's URL, method, headers and [`Parameters`] into an
//! [`EncodedRequest`] a transport can send as-is.
//!
//! | mode | output |
//! |------|--------|
//! | [`ParameterEncoding::Url`] | query string for `GET`/`HEAD`/`DELETE`, form body otherwise |
//! | [`ParameterEncoding::UrlEncodedInUrl`] | query string for every method |
//! | [`ParameterEncoding::Json`] | JSON object body |
//! | [`ParameterEncoding::MultipartFormData`] | `multipart/form-data` body, streamed above a size threshold |
//! | [`ParameterEncoding::Custom`] | whatever the injected transform returns |
//!
//! Encoding is deterministic: value-equal inputs give byte-identical output.

mod multipart;
mod query;

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BoxError, Error};
use crate::parameter::Parameters;

pub use self::multipart::MultipartStream;
pub use self::query::{escape, query_string};

/// Default size at which multipart bodies switch from buffered to streamed.
pub const DEFAULT_MULTIPART_MEMORY_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Options that influence encoding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct EncodingOptions {
    /// Multipart bodies of this many bytes or more (or of unknown length)
    /// are streamed instead of buffered in memory.
    pub multipart_memory_threshold: u64,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            multipart_memory_threshold: DEFAULT_MULTIPART_MEMORY_THRESHOLD,
        }
    }
}

type CustomFn =
    dyn Fn(EncodedRequest, &Parameters) -> Result<EncodedRequest, BoxError> + Send + Sync;

/// User supplied encoding transform.
///
/// Receives the request built from the endpoint's URL, method and headers
/// plus the raw parameters, and returns the request to send.
#[derive(Clone)]
pub struct CustomEncoding(Arc<CustomFn>);

impl CustomEncoding {
    /// Wraps a transform.
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(EncodedRequest, &Parameters) -> Result<EncodedRequest, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(transform))
    }
}

impl PartialEq for CustomEncoding {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for CustomEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomEncoding(..)")
    }
}

/// How parameters are placed into the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParameterEncoding {
    /// Query string for `GET`, `HEAD` and `DELETE`; form-urlencoded body otherwise.
    #[default]
    Url,
    /// Same algorithm as [`ParameterEncoding::Url`], always applied to the URL.
    UrlEncodedInUrl,
    /// JSON object body with `Content-Type: application/json`.
    Json,
    /// `multipart/form-data` body.
    MultipartFormData,
    /// Injected transform.
    Custom(CustomEncoding),
}

impl ParameterEncoding {
    /// Encodes `parameters` into `request`.
    ///
    /// Empty parameters still go through the encoder: body modes get their
    /// content type and an empty body (`{}` for JSON), query modes append
    /// nothing.
    pub fn encode(
        &self,
        request: EncodedRequest,
        parameters: &Parameters,
        options: &EncodingOptions,
    ) -> Result<EncodedRequest, Error> {
        match self {
            Self::Custom(custom) => {
                (custom.0)(request, parameters).map_err(Error::BuildRequestFailed)
            }
            Self::Url => query::encode(request, parameters, false),
            Self::UrlEncodedInUrl => query::encode(request, parameters, true),
            Self::Json => encode_json(request, parameters),
            Self::MultipartFormData => multipart::encode(request, parameters, options),
        }
    }
}

fn encode_json(
    mut request: EncodedRequest,
    parameters: &Parameters,
) -> Result<EncodedRequest, Error> {
    let body = serde_json::to_vec(parameters).map_err(Error::build_request)?;
    request
        .headers
        .entry(CONTENT_TYPE)
        .or_insert(HeaderValue::from_static("application/json"));
    request.body = RequestBody::Bytes(Bytes::from(body));
    Ok(request)
}

/// Body of an encoded request.
#[derive(Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// Fully buffered body.
    Bytes(Bytes),
    /// Body produced lazily, chunk by chunk.
    Stream(MultipartStream),
}

impl RequestBody {
    /// Buffered bytes, if the body is buffered.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Exact body length, when known up front.
    pub fn content_length(&self) -> Option<u64> {
        match self {
            Self::Empty => Some(0),
            Self::Bytes(bytes) => Some(bytes.len() as u64),
            Self::Stream(stream) => stream.content_length(),
        }
    }

    /// Returns `true` if the body is produced lazily.
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Self::Stream(stream) => f
                .debug_struct("Stream")
                .field("content_length", &stream.content_length())
                .finish(),
        }
    }
}

/// A wire-ready request.
#[derive(Debug)]
pub struct EncodedRequest {
    /// Request URL, including any encoded query.
    pub url: Url,
    /// HTTP method.
    pub method: Method,
    /// Header fields.
    pub headers: HeaderMap,
    /// Request body.
    pub body: RequestBody,
}

impl EncodedRequest {
    /// A request with no body.
    pub fn new(url: Url, method: Method, headers: HeaderMap) -> Self {
        Self {
            url,
            method,
            headers,
            body: RequestBody::Empty,
        }
    }

    /// Value of the `Content-Type` header, if present and valid UTF-8.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}
