//! Binary payloads: anonymous blobs and named files.

use bytes::Bytes;

/// An anonymous binary payload with an optional MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blob {
    bytes: Bytes,
    content_type: Option<String>,
}

impl Blob {
    /// Wrap raw bytes.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Blob {
            bytes: bytes.into(),
            content_type: None,
        }
    }

    /// Attach a MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// The raw bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// MIME type, if known.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the blob is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lossy UTF-8 view of the contents.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// Consume into the raw bytes.
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

impl From<Bytes> for Blob {
    fn from(bytes: Bytes) -> Self {
        Blob::new(bytes)
    }
}

impl From<Vec<u8>> for Blob {
    fn from(bytes: Vec<u8>) -> Self {
        Blob::new(bytes)
    }
}

/// A blob carrying a file name, produced when a response names its attachment
/// or supplied by callers for multipart uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedFile {
    name: String,
    blob: Blob,
}

impl NamedFile {
    /// Name a blob.
    pub fn new(name: impl Into<String>, blob: Blob) -> Self {
        NamedFile {
            name: name.into(),
            blob,
        }
    }

    /// File name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying blob.
    pub fn blob(&self) -> &Blob {
        &self.blob
    }

    /// The raw bytes.
    pub fn bytes(&self) -> &Bytes {
        self.blob.bytes()
    }

    /// Drop the name.
    pub fn into_blob(self) -> Blob {
        self.blob
    }
}

impl From<NamedFile> for Blob {
    fn from(file: NamedFile) -> Self {
        file.blob
    }
}
