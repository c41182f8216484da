//! Responses and their derived status class.

use std::fmt;
use std::ops::RangeInclusive;

use bytes::Bytes;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::error::Error;

/// Category of a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseClass {
    /// 100..=199
    Informational,
    /// 200..=299
    Success,
    /// 300..=399
    Redirection,
    /// 400..=499
    ClientError,
    /// 500..=599
    ServerError,
    /// Anything else.
    Undefined,
}

impl ResponseClass {
    /// Classifies `status_code`.
    pub fn from_status_code(status_code: u16) -> Self {
        match status_code {
            100..=199 => Self::Informational,
            200..=299 => Self::Success,
            300..=399 => Self::Redirection,
            400..=499 => Self::ClientError,
            500..=599 => Self::ServerError,
            _ => Self::Undefined,
        }
    }
}

/// Status code rejected by one of the `filter_*` helpers on [`Response`].
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("unexpected status code {status_code}")]
pub struct UnexpectedStatus {
    /// The rejected status code.
    pub status_code: u16,
}

/// A completed HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code.
    pub status_code: u16,
    /// Body bytes.
    pub body: Bytes,
    /// Header fields.
    pub headers: HeaderMap,
    /// URL that produced the response, when the transport reports one.
    pub url: Option<Url>,
}

impl Response {
    /// A response with no headers and no URL.
    pub fn new(status_code: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status_code,
            body: body.into(),
            headers: HeaderMap::new(),
            url: None,
        }
    }

    /// Sets the headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the URL.
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Class of [`status_code`](Self::status_code), recomputed on every call.
    pub fn response_class(&self) -> ResponseClass {
        ResponseClass::from_status_code(self.status_code)
    }

    /// Keeps the response if its status code lies in `range`.
    pub fn filter_status_codes(self, range: RangeInclusive<u16>) -> Result<Self, Error> {
        if range.contains(&self.status_code) {
            Ok(self)
        } else {
            Err(Error::underlying(UnexpectedStatus {
                status_code: self.status_code,
            }))
        }
    }

    /// Keeps 2xx responses.
    pub fn filter_successful_status_codes(self) -> Result<Self, Error> {
        self.filter_status_codes(200..=299)
    }

    /// Keeps 2xx and 3xx responses.
    pub fn filter_successful_status_and_redirect_codes(self) -> Result<Self, Error> {
        self.filter_status_codes(200..=399)
    }

    /// Body as UTF-8 text.
    pub fn map_string(&self) -> Result<String, Error> {
        String::from_utf8(self.body.to_vec()).map_err(Error::underlying)
    }

    /// Body deserialized from JSON.
    pub fn map_json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(Error::underlying)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Status Code: {}, Data Length: {}",
            self.status_code,
            self.body.len()
        )
    }
}
