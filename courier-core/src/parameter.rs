//! Parameter values carried by a [`Target`](crate::Target).
//!
//! Parameters form a tree of tagged values instead of an untyped map:
//! scalars, arrays, nested maps and multipart payloads. Maps are
//! [`BTreeMap`]s, so iteration order never depends on hashing and two
//! value-equal trees always encode to the same bytes.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use serde::ser::{Error as _, Serialize, Serializer};

/// Parameter map of a target or endpoint.
pub type Parameters = BTreeMap<String, ParameterValue>;

/// Builds a [`Parameters`] map from key/value pairs.
///
/// ```
/// use courier_core::{ParameterValue, parameters};
///
/// let params = parameters([("page", ParameterValue::from(2)), ("q", "rust".into())]);
/// assert_eq!(params.len(), 2);
/// ```
pub fn parameters<K, V, I>(pairs: I) -> Parameters
where
    K: Into<String>,
    V: Into<ParameterValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    /// Explicit null. Encodes as an empty string in URL mode and `null` in JSON.
    Null,
    /// Boolean. Encodes as `1`/`0` in URL and multipart modes.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number. Non-finite values fail JSON encoding.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered list, encoded as repeated `key[]` pairs in URL mode.
    Array(Vec<ParameterValue>),
    /// Nested map, encoded as `key[subkey]` pairs in URL mode.
    Map(Parameters),
    /// Binary payload; only valid with multipart encoding.
    Multipart(MultipartPayload),
}

impl ParameterValue {
    /// Returns `true` for [`ParameterValue::Multipart`].
    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }

    /// Textual form of a scalar, as used by URL and multipart encoding.
    ///
    /// Returns `None` for arrays, maps and multipart payloads.
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            Self::Null => Some(String::new()),
            Self::Bool(value) => Some(if *value { "1" } else { "0" }.to_owned()),
            Self::Int(value) => Some(value.to_string()),
            Self::UInt(value) => Some(value.to_string()),
            Self::Float(value) => Some(value.to_string()),
            Self::String(value) => Some(value.clone()),
            Self::Array(_) | Self::Map(_) | Self::Multipart(_) => None,
        }
    }
}

impl Serialize for ParameterValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Int(value) => serializer.serialize_i64(*value),
            Self::UInt(value) => serializer.serialize_u64(*value),
            Self::Float(value) if value.is_finite() => serializer.serialize_f64(*value),
            Self::Float(value) => Err(S::Error::custom(format!(
                "non-finite number {value} cannot be serialized"
            ))),
            Self::String(value) => serializer.serialize_str(value),
            Self::Array(values) => serializer.collect_seq(values),
            Self::Map(values) => serializer.collect_map(values),
            Self::Multipart(payload) => Err(S::Error::custom(format!(
                "multipart payload {payload:?} cannot be serialized"
            ))),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$ty> for ParameterValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(<$target>::from(value))
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => UInt as u64,
    u16 => UInt as u64,
    u32 => UInt as u64,
    u64 => UInt as u64,
    f32 => Float as f64,
    f64 => Float as f64,
    String => String as String,
    &str => String as String,
    Parameters => Map as Parameters,
    MultipartPayload => Multipart as MultipartPayload,
}

impl From<usize> for ParameterValue {
    fn from(value: usize) -> Self {
        Self::UInt(value as u64)
    }
}

impl<T> From<Vec<T>> for ParameterValue
where
    T: Into<ParameterValue>,
{
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T> From<Option<T>> for ParameterValue
where
    T: Into<ParameterValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Reader returned by a [`PayloadStream`].
pub type PayloadReader = Box<dyn Read + Send + Sync>;

type OpenFn = dyn Fn() -> std::io::Result<PayloadReader> + Send + Sync;

/// A re-openable byte stream used as a multipart payload.
///
/// The stream is opened lazily, when the body is actually produced, and may
/// be opened more than once if the same target is encoded repeatedly.
#[derive(Clone)]
pub struct PayloadStream {
    open: Arc<OpenFn>,
    length: Option<u64>,
}

impl PayloadStream {
    /// Creates a stream source. `length` is the exact byte count if known.
    pub fn new<F>(length: Option<u64>, open: F) -> Self
    where
        F: Fn() -> std::io::Result<PayloadReader> + Send + Sync + 'static,
    {
        Self {
            open: Arc::new(open),
            length,
        }
    }

    /// Opens a fresh reader.
    pub fn open(&self) -> std::io::Result<PayloadReader> {
        (self.open)()
    }

    /// Declared length in bytes.
    pub fn length(&self) -> Option<u64> {
        self.length
    }
}

impl PartialEq for PayloadStream {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.open), Arc::as_ptr(&other.open))
            && self.length == other.length
    }
}

impl fmt::Debug for PayloadStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadStream")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

/// Where the bytes of a multipart payload come from.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadSource {
    /// In-memory bytes.
    Bytes(Bytes),
    /// A file read when the body is produced.
    File(PathBuf),
    /// An arbitrary stream.
    Stream(PayloadStream),
}

/// A named body part for `multipart/form-data` uploads.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPayload {
    source: PayloadSource,
    file_name: Option<String>,
    mime_type: Option<String>,
}

impl MultipartPayload {
    /// Payload from in-memory bytes.
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Self::from_source(PayloadSource::Bytes(data.into()))
    }

    /// Payload read from a file.
    ///
    /// Unless overridden, the part's filename is the last path component.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::from_source(PayloadSource::File(path.into()))
    }

    /// Payload read from a stream.
    pub fn stream(stream: PayloadStream) -> Self {
        Self::from_source(PayloadSource::Stream(stream))
    }

    fn from_source(source: PayloadSource) -> Self {
        Self {
            source,
            file_name: None,
            mime_type: None,
        }
    }

    /// Sets the filename reported in `Content-Disposition`.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Sets the part's `Content-Type`.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Byte source.
    pub fn source(&self) -> &PayloadSource {
        &self.source
    }

    /// Filename, falling back to the file's own name for file payloads.
    pub fn file_name(&self) -> Option<String> {
        self.file_name.clone().or_else(|| match &self.source {
            PayloadSource::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            _ => None,
        })
    }

    /// Declared MIME type.
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }
}
