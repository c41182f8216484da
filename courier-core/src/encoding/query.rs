//! URL (query string / form body) encoding.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use super::{EncodedRequest, RequestBody};
use crate::error::Error;
use crate::parameter::{MultipartPayload, ParameterValue, Parameters};

/// Characters escaped in query keys and values.
///
/// RFC 3986 reserved characters are all escaped except `?` and `/`
/// (section 3.4 allows both inside a query).
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/')
    .remove(b'?');

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Percent-escapes a query key or value.
///
/// ```
/// use courier_core::encoding::escape;
///
/// assert_eq!(escape("a b&c=d/e?f"), "a%20b%26c%3Dd/e?f");
/// ```
pub fn escape(value: &str) -> String {
    utf8_percent_encode(value, QUERY_COMPONENT).to_string()
}

/// A flattened leaf of the parameter tree.
pub(super) enum Leaf<'a> {
    Scalar(String),
    Payload(&'a MultipartPayload),
}

/// Flattens `parameters` into `(key, leaf)` pairs sorted by key.
///
/// Nested maps become `key[subkey]`, arrays become repeated `key[]`. The sort
/// is stable, so array elements keep their order.
pub(super) fn flatten(parameters: &Parameters) -> Vec<(String, Leaf<'_>)> {
    let mut leaves = Vec::new();
    for (key, value) in parameters {
        flatten_into(key.clone(), value, &mut leaves);
    }
    leaves.sort_by(|(left, _), (right, _)| left.cmp(right));
    leaves
}

fn flatten_into<'a>(key: String, value: &'a ParameterValue, leaves: &mut Vec<(String, Leaf<'a>)>) {
    match value {
        ParameterValue::Map(nested) => {
            for (nested_key, nested_value) in nested {
                flatten_into(format!("{key}[{nested_key}]"), nested_value, leaves);
            }
        }
        ParameterValue::Array(values) => {
            for nested_value in values {
                flatten_into(format!("{key}[]"), nested_value, leaves);
            }
        }
        ParameterValue::Multipart(payload) => leaves.push((key, Leaf::Payload(payload))),
        scalar => {
            let text = scalar.to_scalar_string().unwrap_or_default();
            leaves.push((key, Leaf::Scalar(text)));
        }
    }
}

/// Builds the escaped `key=value&...` string for `parameters`.
///
/// Multipart payloads cannot be expressed in a query and fail with
/// [`Error::BuildRequestFailed`].
pub fn query_string(parameters: &Parameters) -> Result<String, Error> {
    let mut components = Vec::new();
    for (key, leaf) in flatten(parameters) {
        match leaf {
            Leaf::Scalar(value) => components.push(format!("{}={}", escape(&key), escape(&value))),
            Leaf::Payload(_) => {
                return Err(Error::build_request(format!(
                    "parameter `{key}` is a multipart payload and needs multipart/form-data encoding"
                )));
            }
        }
    }
    Ok(components.join("&"))
}

fn encodes_in_url(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::DELETE
}

pub(super) fn encode(
    mut request: EncodedRequest,
    parameters: &Parameters,
    always_in_url: bool,
) -> Result<EncodedRequest, Error> {
    let query = query_string(parameters)?;

    if always_in_url || encodes_in_url(&request.method) {
        if parameters.is_empty() {
            return Ok(request);
        }
        let combined = match request.url.query() {
            Some(existing) => format!("{existing}&{query}"),
            None => query,
        };
        request.url.set_query(Some(&combined));
    } else {
        request
            .headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static(FORM_CONTENT_TYPE));
        request.body = RequestBody::Bytes(Bytes::from(query));
    }

    Ok(request)
}
