//! MIME errors.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structural problems found while parsing a document.
///
/// Bad transfer encodings and unknown charsets never end up here; the
/// decoders substitute instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A header block line is neither a field nor a continuation.
    #[error("Invalid header line: {0}")]
    InvalidHeader(String),

    /// A `Content-Type` value has no `type/subtype`.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Strict base64 decoding failed.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Multipart entities nest too deeply.
    #[error("Invalid multipart body: {0}")]
    InvalidMultipart(String),
}
