//! `multipart/form-data` encoding.
//!
//! Parts are laid out in flattened key order:
//!
//! ```text
//! --{boundary}\r\n
//! Content-Disposition: form-data; name="{key}"[; filename="{file}"\r\n
//! Content-Type: {mime}]\r\n
//! \r\n
//! {content}
//! \r\n--{boundary}\r\n
//! ...
//! \r\n--{boundary}--\r\n
//! ```
//!
//! A parameter map with no parts encodes to an empty body.
//!
//! Bodies whose total length is known and below the memory threshold are
//! buffered. Everything else becomes a [`MultipartStream`] that opens files
//! and payload streams only when it is read.

use std::collections::VecDeque;
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use bytes::{Bytes, BytesMut};
use http::HeaderValue;
use http::header::CONTENT_TYPE;
use sha2::{Digest, Sha256};

use super::query::{Leaf, escape, flatten};
use super::{EncodedRequest, EncodingOptions, RequestBody};
use crate::error::Error;
use crate::parameter::{MultipartPayload, Parameters, PayloadReader, PayloadSource, PayloadStream};

const BOUNDARY_PREFIX: &str = "courier.boundary.";
const CRLF: &str = "\r\n";
const STREAM_CHUNK_SIZE: usize = 64 * 1024;
const OCTET_STREAM: &str = "application/octet-stream";

/// One piece of a multipart body.
enum Segment {
    Static(Bytes),
    File(PathBuf),
    Stream(PayloadStream),
}

struct Part<'a> {
    name: String,
    content: PartContent<'a>,
}

enum PartContent<'a> {
    Field(String),
    Payload(&'a MultipartPayload),
}

pub(super) fn encode(
    mut request: EncodedRequest,
    parameters: &Parameters,
    options: &EncodingOptions,
) -> Result<EncodedRequest, Error> {
    let parts: Vec<Part<'_>> = flatten(parameters)
        .into_iter()
        .map(|(key, leaf)| Part {
            name: escape(&key),
            content: match leaf {
                Leaf::Scalar(value) => PartContent::Field(escape(&value)),
                Leaf::Payload(payload) => PartContent::Payload(payload),
            },
        })
        .collect();

    let boundary = boundary(&parts);
    let mut segments = Vec::with_capacity(parts.len() * 2 + 1);
    let mut content_length = Some(0u64);

    for (index, part) in parts.iter().enumerate() {
        let opening = if index == 0 {
            format!("--{boundary}{CRLF}")
        } else {
            format!("{CRLF}--{boundary}{CRLF}")
        };
        let header = Bytes::from(format!("{opening}{}{CRLF}", part_headers(part)));
        content_length = content_length.map(|total| total + header.len() as u64);
        segments.push(Segment::Static(header));

        let (segment, length) = part_segment(part)?;
        content_length = content_length.zip(length).map(|(total, length)| total + length);
        segments.push(segment);
    }

    if !parts.is_empty() {
        let closing = Bytes::from(format!("{CRLF}--{boundary}--{CRLF}"));
        content_length = content_length.map(|total| total + closing.len() as u64);
        segments.push(Segment::Static(closing));
    }

    let content_type = HeaderValue::from_str(&format!("multipart/form-data; boundary={boundary}"))
        .map_err(Error::build_request)?;
    request.headers.insert(CONTENT_TYPE, content_type);

    let stream = MultipartStream::new(segments, content_length);
    request.body = match content_length {
        Some(length) if length < options.multipart_memory_threshold => {
            RequestBody::Bytes(stream.into_bytes().map_err(Error::build_request)?)
        }
        _ => RequestBody::Stream(stream),
    };

    Ok(request)
}

fn part_headers(part: &Part<'_>) -> String {
    let mut headers = format!("Content-Disposition: form-data; name=\"{}\"", part.name);

    if let PartContent::Payload(payload) = &part.content
        && let Some((file_name, mime_type)) = file_attributes(payload)
    {
        headers.push_str(&format!("; filename=\"{file_name}\"{CRLF}Content-Type: {mime_type}"));
    }

    headers.push_str(CRLF);
    headers
}

/// Filename and MIME type announced for a payload part.
///
/// In-memory and stream payloads announce them only when both are declared.
/// File payloads fall back to the file's own name and
/// `application/octet-stream`.
fn file_attributes(payload: &MultipartPayload) -> Option<(String, String)> {
    match payload.source() {
        PayloadSource::File(_) => {
            let mime_type = payload.mime_type().unwrap_or(OCTET_STREAM);
            payload
                .file_name()
                .map(|file_name| (file_name, mime_type.to_owned()))
        }
        PayloadSource::Bytes(_) | PayloadSource::Stream(_) => {
            match (payload.file_name(), payload.mime_type()) {
                (Some(file_name), Some(mime_type)) => Some((file_name, mime_type.to_owned())),
                _ => None,
            }
        }
    }
}

fn part_segment(part: &Part<'_>) -> Result<(Segment, Option<u64>), Error> {
    match &part.content {
        PartContent::Field(value) => {
            let bytes = Bytes::from(value.clone());
            let length = bytes.len() as u64;
            Ok((Segment::Static(bytes), Some(length)))
        }
        PartContent::Payload(payload) => match payload.source() {
            PayloadSource::Bytes(bytes) => {
                Ok((Segment::Static(bytes.clone()), Some(bytes.len() as u64)))
            }
            PayloadSource::File(path) => {
                let length = file_length(path)?;
                Ok((Segment::File(path.clone()), Some(length)))
            }
            PayloadSource::Stream(stream) => Ok((Segment::Stream(stream.clone()), stream.length())),
        },
    }
}

fn file_length(path: &Path) -> Result<u64, Error> {
    let metadata = std::fs::metadata(path).map_err(|error| {
        Error::build_request(io::Error::new(
            error.kind(),
            format!("multipart file {} is not readable: {error}", path.display()),
        ))
    })?;
    if !metadata.is_file() {
        return Err(Error::build_request(format!(
            "multipart file {} is not a regular file",
            path.display()
        )));
    }
    Ok(metadata.len())
}

/// Derives the boundary from part names and content descriptors.
fn boundary(parts: &[Part<'_>]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.name.as_bytes());
        hasher.update([0]);
        match &part.content {
            PartContent::Field(value) => {
                hasher.update(b"field");
                hasher.update(value.as_bytes());
            }
            PartContent::Payload(payload) => {
                hasher.update(payload.file_name().unwrap_or_default().as_bytes());
                hasher.update([0]);
                hasher.update(payload.mime_type().unwrap_or_default().as_bytes());
                hasher.update([0]);
                match payload.source() {
                    PayloadSource::Bytes(bytes) => {
                        hasher.update(b"bytes");
                        hasher.update(bytes);
                    }
                    PayloadSource::File(path) => {
                        hasher.update(b"file");
                        hasher.update(path.to_string_lossy().as_bytes());
                    }
                    PayloadSource::Stream(stream) => {
                        hasher.update(b"stream");
                        hasher.update(stream.length().unwrap_or(u64::MAX).to_be_bytes());
                    }
                }
            }
        }
        hasher.update([0xff]);
    }
    let digest = hex::encode(hasher.finalize());
    format!("{BOUNDARY_PREFIX}{}", &digest[..16])
}

/// Lazily produced `multipart/form-data` body.
///
/// Yields the body in chunks of at most 64 KiB. Files and payload streams are
/// opened when the iterator reaches them.
pub struct MultipartStream {
    segments: VecDeque<Segment>,
    reader: Option<PayloadReader>,
    content_length: Option<u64>,
}

impl MultipartStream {
    fn new(segments: Vec<Segment>, content_length: Option<u64>) -> Self {
        Self {
            segments: segments.into(),
            reader: None,
            content_length,
        }
    }

    /// Total body length, if every part declared one.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Reads the whole body into memory.
    pub fn into_bytes(self) -> io::Result<Bytes> {
        let capacity = self.content_length.unwrap_or(0) as usize;
        let mut buffer = BytesMut::with_capacity(capacity);
        for chunk in self {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer.freeze())
    }

    fn read_chunk(&mut self) -> Option<io::Result<Bytes>> {
        let reader = self.reader.as_mut()?;
        let mut chunk = vec![0u8; STREAM_CHUNK_SIZE];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => {
                    self.reader = None;
                    return None;
                }
                Ok(read) => {
                    chunk.truncate(read);
                    return Some(Ok(Bytes::from(chunk)));
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => {
                    self.reader = None;
                    self.segments.clear();
                    return Some(Err(error));
                }
            }
        }
    }
}

impl Iterator for MultipartStream {
    type Item = io::Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(chunk) = self.read_chunk() {
                return Some(chunk);
            }

            let opened = match self.segments.pop_front()? {
                Segment::Static(bytes) if bytes.is_empty() => continue,
                Segment::Static(bytes) => return Some(Ok(bytes)),
                Segment::File(path) => {
                    std::fs::File::open(&path).map(|file| Box::new(file) as PayloadReader)
                }
                Segment::Stream(stream) => stream.open(),
            };

            match opened {
                Ok(reader) => self.reader = Some(reader),
                Err(error) => {
                    self.segments.clear();
                    return Some(Err(error));
                }
            }
        }
    }
}

impl fmt::Debug for MultipartStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartStream")
            .field("remaining_segments", &self.segments.len())
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}
