//! `multipart/form-data` body encoding.
//!
//! The HTTP agent has no multipart support of its own, so requests carrying
//! file parts are encoded here: one part per plain field value, then one part
//! per file. Part headers are built up front; file contents are streamed from
//! disk when the body is read, so large datasets never sit in memory.

use std::fs::File;
use std::io::{Cursor, Read};

use crate::error::{WelesError, WelesResult};
use crate::request::OutboundRequest;

const CRLF: &str = "\r\n";

#[derive(Debug)]
enum Segment {
    Bytes(Vec<u8>),
    File { file: File, len: u64 },
}

impl Segment {
    fn len(&self) -> u64 {
        match self {
            Segment::Bytes(bytes) => bytes.len() as u64,
            Segment::File { len, .. } => *len,
        }
    }
}

/// An encoded multipart body.
#[derive(Debug)]
pub struct MultipartBody {
    boundary: String,
    segments: Vec<Segment>,
}

impl MultipartBody {
    /// Encode all fields of `request` and open its files.
    ///
    /// Files are opened here so a missing file fails before anything is sent.
    pub fn encode(request: &OutboundRequest) -> WelesResult<Self> {
        let boundary = format!("------------------------weles{}", uuid::Uuid::new_v4().simple());
        let mut segments = Vec::new();
        let mut head = Vec::new();

        for (name, value) in request.fields.form_pairs() {
            head.extend_from_slice(format!("--{}{}", boundary, CRLF).as_bytes());
            head.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"{}{}",
                    escape(name),
                    CRLF,
                    CRLF
                )
                .as_bytes(),
            );
            head.extend_from_slice(value.as_bytes());
            head.extend_from_slice(CRLF.as_bytes());
        }

        for part in &request.files {
            let file = File::open(&part.path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    WelesError::NotFound(part.path.clone())
                } else {
                    WelesError::Io(e)
                }
            })?;
            let len = file.metadata()?.len();

            head.extend_from_slice(format!("--{}{}", boundary, CRLF).as_bytes());
            head.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"{}",
                    escape(&part.field),
                    escape(&part.file_name),
                    CRLF
                )
                .as_bytes(),
            );
            head.extend_from_slice(format!("Content-Type: application/octet-stream{}{}", CRLF, CRLF).as_bytes());
            segments.push(Segment::Bytes(std::mem::take(&mut head)));
            segments.push(Segment::File { file, len });
            head.extend_from_slice(CRLF.as_bytes());
        }

        head.extend_from_slice(format!("--{}--{}", boundary, CRLF).as_bytes());
        segments.push(Segment::Bytes(head));
        Ok(Self { boundary, segments })
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Total body size, sent as `Content-Length`.
    pub fn content_length(&self) -> u64 {
        self.segments.iter().map(Segment::len).sum()
    }

    /// The body as one reader. Each file contributes exactly the length it
    /// had when it was opened.
    pub fn into_reader(self) -> Box<dyn Read + Send> {
        let empty: Box<dyn Read + Send> = Box::new(std::io::empty());
        self.segments
            .into_iter()
            .fold(empty, |body, segment| -> Box<dyn Read + Send> {
                match segment {
                    Segment::Bytes(bytes) => Box::new(body.chain(Cursor::new(bytes))),
                    Segment::File { file, len } => Box::new(body.chain(file.take(len))),
                }
            })
    }
}

fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
}
