//! Binary content with its metadata.

use std::fs;
use std::io;
use std::path::Path;

use bytes::Bytes;

/// Default mime type when nothing better is known
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A blob held fully in memory.
///
/// The bytes are reference counted, so clones (and cache entries) share the
/// same buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    filename: Option<String>,
    mime_type: String,
    data: Bytes,
}

impl Blob {
    pub fn new(data: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            filename: None,
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Read a file into a blob named after the file
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        Ok(Self {
            filename,
            mime_type: mime_type_for(path).to_string(),
            data: Bytes::from(data),
        })
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn length(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Content as UTF-8 text, if it is valid UTF-8
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Write the content to a file
    pub fn write_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        fs::write(path, &self.data)
    }
}

fn mime_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("html") => "text/html",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => OCTET_STREAM,
    }
}
