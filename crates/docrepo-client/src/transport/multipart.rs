//! Multipart framing for blob transfer.
//!
//! Requests carrying blobs are sent as `multipart/related`: the first part
//! is the JSON automation request, each following part one blob. Responses
//! carrying several blobs come back as `multipart/mixed` and are split into
//! ordered parts here. Decoding works on a fully received body and never
//! waits for more input: a malformed body fails immediately.

use bytes::{BufMut, Bytes, BytesMut};
use docrepo_error::{ClientError, ClientResult};
use docrepo_types::blob::OCTET_STREAM;
use docrepo_types::Blob;
use uuid::Uuid;

const CRLF: &[u8] = b"\r\n";

/// One part of a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub content_type: String,
    pub content_id: Option<String>,
    pub filename: Option<String>,
    pub body: Bytes,
}

impl Part {
    pub fn new(content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            content_id: None,
            filename: None,
            body: body.into(),
        }
    }

    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    pub fn from_blob(blob: &Blob) -> Self {
        Self {
            content_type: blob.mime_type().to_string(),
            content_id: None,
            filename: blob.filename().map(str::to_string),
            body: blob.data().clone(),
        }
    }

    pub fn into_blob(self) -> Blob {
        let blob = Blob::new(self.body, self.content_type);
        match self.filename {
            Some(filename) => blob.with_filename(filename),
            None => blob,
        }
    }
}

/// Fresh boundary string
pub fn new_boundary() -> String {
    format!("docrepo-{}", Uuid::new_v4().simple())
}

/// Content type of an outgoing multipart request
pub fn related_content_type(boundary: &str) -> String {
    format!(
        "multipart/related; boundary=\"{}\"; type=\"{}\"",
        boundary,
        super::AUTOMATION_CONTENT_TYPE
    )
}

/// Content type of a multipart response
pub fn mixed_content_type(boundary: &str) -> String {
    format!("multipart/mixed; boundary=\"{}\"", boundary)
}

/// Frame parts with the given boundary
pub fn encode(boundary: &str, parts: &[Part]) -> Bytes {
    let mut out = BytesMut::new();
    for part in parts {
        out.put_slice(b"--");
        out.put_slice(boundary.as_bytes());
        out.put_slice(CRLF);
        out.put_slice(format!("Content-Type: {}", part.content_type).as_bytes());
        out.put_slice(CRLF);
        if let Some(content_id) = &part.content_id {
            out.put_slice(format!("Content-ID: <{}>", content_id).as_bytes());
            out.put_slice(CRLF);
        }
        if let Some(filename) = &part.filename {
            out.put_slice(
                format!("Content-Disposition: attachment; filename=\"{}\"", filename).as_bytes(),
            );
            out.put_slice(CRLF);
        }
        out.put_slice(CRLF);
        out.put_slice(&part.body);
        out.put_slice(CRLF);
    }
    out.put_slice(b"--");
    out.put_slice(boundary.as_bytes());
    out.put_slice(b"--");
    out.put_slice(CRLF);
    out.freeze()
}

/// Extract the boundary parameter of a multipart content type
pub fn boundary_of(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|boundary| !boundary.is_empty())
}

/// Split a multipart body into its parts, in order
pub fn decode(content_type: &str, body: &[u8]) -> ClientResult<Vec<Part>> {
    let boundary = boundary_of(content_type).ok_or_else(|| {
        ClientError::decoding(format!("multipart content type without boundary: {}", content_type))
    })?;
    let delimiter = [b"--".as_slice(), boundary.as_bytes()].concat();

    let mut cursor = find(body, &delimiter, 0)
        .ok_or_else(|| ClientError::decoding("multipart body has no opening delimiter"))?
        + delimiter.len();
    let mut parts = Vec::new();

    loop {
        if body[cursor..].starts_with(b"--") {
            return Ok(parts);
        }
        cursor = skip_line_break(body, cursor);

        let (headers_end, terminator_len) = header_terminator(body, cursor)
            .ok_or_else(|| ClientError::decoding("multipart part without header terminator"))?;
        let headers = std::str::from_utf8(&body[cursor..headers_end])
            .map_err(|_| ClientError::decoding("multipart part headers are not UTF-8"))?;
        let content_start = headers_end + terminator_len;

        // The line break before a delimiter is CRLF or a bare LF
        let closing = [b"\n".as_slice(), delimiter.as_slice()].concat();
        let closing_at = find(body, &closing, content_start)
            .ok_or_else(|| ClientError::decoding("multipart body is not terminated"))?;
        let content_end = if closing_at > content_start && body[closing_at - 1] == b'\r' {
            closing_at - 1
        } else {
            closing_at
        };

        parts.push(parse_part(
            headers,
            Bytes::copy_from_slice(&body[content_start..content_end]),
        ));
        cursor = closing_at + closing.len();
    }
}

fn parse_part(headers: &str, body: Bytes) -> Part {
    let mut part = Part::new(OCTET_STREAM, body);
    for line in headers.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "content-type" => part.content_type = value.to_string(),
            "content-id" => {
                let id = value.trim_start_matches('<').trim_end_matches('>');
                part.content_id = Some(id.to_string())
            }
            "content-disposition" => part.filename = filename_of(value),
            _ => {}
        }
    }
    part
}

/// Filename parameter of a Content-Disposition value
pub fn filename_of(disposition: &str) -> Option<String> {
    disposition
        .split(';')
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("filename"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
}

/// Offset and length of the blank line ending a part's headers
fn header_terminator(body: &[u8], from: usize) -> Option<(usize, usize)> {
    let crlf = find(body, b"\r\n\r\n", from).map(|at| (at, 4));
    let lf = find(body, b"\n\n", from).map(|at| (at, 2));
    match (crlf, lf) {
        (Some(crlf), Some(lf)) => Some(if lf.0 < crlf.0 { lf } else { crlf }),
        (crlf, lf) => crlf.or(lf),
    }
}

fn skip_line_break(body: &[u8], cursor: usize) -> usize {
    if body[cursor..].starts_with(CRLF) {
        cursor + 2
    } else if body[cursor..].starts_with(b"\n") {
        cursor + 1
    } else {
        cursor
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}
