//! MIME message structure and handling.

use crate::charset;
use crate::content_type::ContentType;
use crate::encoding::{decode_base64_lenient, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::{Headers, is_continuation, split_field};
use std::fmt;

/// Maximum multipart nesting accepted by the parser.
const MAX_DEPTH: usize = 32;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }

    /// Decodes body bytes. Identity encodings return the input unchanged.
    #[must_use]
    pub fn decode(self, body: &[u8]) -> Vec<u8> {
        match self {
            Self::Base64 => decode_base64_lenient(body),
            Self::QuotedPrintable => decode_quoted_printable(body),
            Self::SevenBit | Self::EightBit | Self::Binary => body.to_vec(),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Body of a MIME entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// A leaf body, still transfer-encoded.
    Single(Vec<u8>),
    /// Child parts of a multipart entity, in document order.
    Multipart(Vec<Part>),
}

/// MIME entity: a header block and a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body.
    pub body: Body,
}

impl Part {
    /// Creates a leaf part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self {
            headers,
            body: Body::Single(body),
        }
    }

    /// Creates a multipart part.
    #[must_use]
    pub const fn multipart(headers: Headers, parts: Vec<Self>) -> Self {
        Self {
            headers,
            body: Body::Multipart(parts),
        }
    }

    /// Gets the content type.
    ///
    /// A missing or unparseable `Content-Type` header yields `text/plain`.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        content_type_of(&self.headers)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Checks if this part holds child parts.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self.body, Body::Multipart(_))
    }

    /// Returns the child parts (empty for leaf parts).
    #[must_use]
    pub fn parts(&self) -> &[Self] {
        match &self.body {
            Body::Multipart(parts) => parts,
            Body::Single(_) => &[],
        }
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// Multipart containers have no body of their own and yield nothing.
    #[must_use]
    pub fn decode_body(&self) -> Vec<u8> {
        match &self.body {
            Body::Single(raw) => self.transfer_encoding().decode(raw),
            Body::Multipart(_) => Vec::new(),
        }
    }

    /// Gets the decoded body as text in the declared charset.
    ///
    /// Undecodable sequences are replaced with U+FFFD, so this never fails.
    #[must_use]
    pub fn body_text(&self) -> String {
        let content_type = self.content_type();
        charset::decode(&self.decode_body(), content_type.charset())
    }

    /// Iterates over this part and all descendants, depth-first in document
    /// order.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    fn parse(raw: &[u8], depth: usize) -> Result<Self> {
        let (header_block, body) = split_header_block(raw);
        let headers = Headers::parse(&charset::lossy(header_block))?;

        let content_type = content_type_of(&headers);
        if !content_type.is_multipart() {
            return Ok(Self::new(headers, body.to_vec()));
        }

        // No boundary parameter, or a boundary the body never uses: keep the
        // entity as a single part.
        let chunks = content_type
            .boundary()
            .and_then(|boundary| split_multipart(body, boundary));
        let Some(chunks) = chunks else {
            return Ok(Self::new(headers, body.to_vec()));
        };

        if depth >= MAX_DEPTH {
            return Err(Error::InvalidMultipart(format!(
                "Nesting deeper than {MAX_DEPTH} levels"
            )));
        }

        let children = chunks
            .into_iter()
            .map(|chunk| Self::parse(chunk, depth + 1))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::multipart(headers, children))
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headers)?;
        writeln!(f)?;

        match &self.body {
            Body::Single(raw) => f.write_str(&charset::lossy(raw).replace("\r\n", "\n")),
            Body::Multipart(parts) => {
                let content_type = self.content_type();
                let boundary = content_type.boundary().unwrap_or_default();
                for part in parts {
                    writeln!(f, "--{boundary}")?;
                    writeln!(f, "{part}")?;
                }
                write!(f, "--{boundary}--")
            }
        }
    }
}

/// Depth-first iterator over a part tree. See [`Part::walk`].
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    stack: Vec<&'a Part>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Part;

    fn next(&mut self) -> Option<Self::Item> {
        let part = self.stack.pop()?;
        self.stack.extend(part.parts().iter().rev());
        Some(part)
    }
}

/// MIME message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    root: Part,
}

impl Message {
    /// Creates a message from its top-level entity.
    #[must_use]
    pub const fn new(root: Part) -> Self {
        Self { root }
    }

    /// Parses a raw RFC 5322 message.
    ///
    /// Header lines end at the first empty line or at the first line that is
    /// not a header field; everything after is the body. A message with no
    /// header block at all is accepted, and so is empty input.
    ///
    /// A multipart entity without a `boundary` parameter, or whose body never
    /// contains its boundary, is kept as a single part holding the raw body.
    ///
    /// # Errors
    ///
    /// Returns an error if multipart entities nest too deeply.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Part::parse(raw, 0).map(Self::new)
    }

    /// Returns the top-level entity.
    #[must_use]
    pub const fn root(&self) -> &Part {
        &self.root
    }

    /// Returns the top-level headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.root.headers
    }

    /// Gets the content type.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.root.content_type()
    }

    /// Checks if this is a multipart message.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        self.root.is_multipart()
    }

    /// Gets the decoded From header.
    #[must_use]
    pub fn from(&self) -> Option<String> {
        self.headers().get_decoded("from")
    }

    /// Gets the decoded Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.headers().get_decoded("subject")
    }

    /// Iterates over every entity of the message, depth-first, starting with
    /// the message itself.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        self.root.walk()
    }

    /// Decodes the body of a single-part message as text.
    #[must_use]
    pub fn body_text(&self) -> String {
        self.root.body_text()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}

fn content_type_of(headers: &Headers) -> ContentType {
    headers
        .get("content-type")
        .and_then(|value| ContentType::parse(value).ok())
        .unwrap_or_else(ContentType::text_plain)
}

/// Splits an entity into its header block and body.
///
/// The header block ends at an empty line, or before the first line that is
/// neither a header field nor a continuation of one.
fn split_header_block(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut pos = 0;

    while pos < raw.len() {
        let line_end = raw[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(raw.len(), |i| pos + i);
        let next = (line_end + 1).min(raw.len());
        let line = charset::lossy(&raw[pos..line_end]);
        let line = line.strip_suffix('\r').unwrap_or(&line);

        if line.is_empty() {
            return (&raw[..pos], &raw[next..]);
        }

        let is_header = if is_continuation(line) {
            pos > 0
        } else {
            split_field(line).is_some()
        };
        if !is_header {
            return (&raw[..pos], &raw[pos..]);
        }

        pos = next;
    }

    (raw, &[])
}

/// Splits a multipart body into the raw bytes of each part.
///
/// The line break before a delimiter belongs to the delimiter. Preamble and
/// epilogue are dropped. A body that ends without the closing delimiter keeps
/// its last part.
///
/// Returns `None` if the boundary never appears as a delimiter.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Option<Vec<&'a [u8]>> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();
    let mut current: Option<usize> = None;
    let mut found = false;
    let mut pos = 0;

    while pos < body.len() {
        let line_end = body[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| pos + i);
        let next = (line_end + 1).min(body.len());
        let line = body[pos..line_end].trim_ascii_end();

        if let Some(rest) = line.strip_prefix(delimiter.as_bytes()) {
            let closing = rest == b"--";
            if closing || rest.is_empty() {
                if let Some(start) = current.take() {
                    parts.push(strip_line_break(&body[start..pos]));
                }
                found = true;
                if closing {
                    break;
                }
                current = Some(next);
            }
        }

        pos = next;
    }

    if let Some(start) = current {
        parts.push(&body[start..]);
    }

    found.then_some(parts)
}

fn strip_line_break(chunk: &[u8]) -> &[u8] {
    chunk
        .strip_suffix(b"\r\n")
        .or_else(|| chunk.strip_suffix(b"\n"))
        .unwrap_or(chunk)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    const MULTIPART: &str = concat!(
        "From: sender@example.com\r\n",
        "Subject: Report\r\n",
        "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
        "\r\n",
        "This is the preamble.\r\n",
        "--outer\r\n",
        "Content-Type: multipart/alternative; boundary=inner\r\n",
        "\r\n",
        "--inner\r\n",
        "Content-Type: text/plain; charset=iso-8859-1\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "caf=E9\r\n",
        "--inner\r\n",
        "Content-Type: text/html\r\n",
        "\r\n",
        "<p>caf&eacute;</p>\r\n",
        "--inner--\r\n",
        "--outer\r\n",
        "Content-Type: application/octet-stream\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "AAEC\r\n",
        "--outer--\r\n",
        "epilogue\r\n"
    );

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("Base64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("x-uuencode"), TransferEncoding::SevenBit);
    }

    #[test]
    fn test_part_body_text() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain; charset=utf-8");
        let part = Part::new(headers, b"Hello, World!".to_vec());

        assert_eq!(part.body_text(), "Hello, World!");
    }

    #[test]
    fn test_part_body_text_base64_utf8() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain; charset=\"UTF-8\"");
        headers.add("Content-Transfer-Encoding", "base64");
        let part = Part::new(headers, b"SMOpbGxv\r\n".to_vec());

        assert_eq!(part.body_text(), "Héllo");
    }

    #[test]
    fn test_part_default_content_type() {
        let part = Part::new(Headers::new(), b"x".to_vec());
        assert!(part.content_type().is_text_plain());

        let mut headers = Headers::new();
        headers.add("Content-Type", "garbage");
        let part = Part::new(headers, b"x".to_vec());
        assert!(part.content_type().is_text_plain());
    }

    #[test]
    fn test_parse_single_part() {
        let raw = b"From: sender@example.com\r\nTo: recipient@example.com\r\nSubject: =?utf-8?q?Hi?=\r\n\r\nhi";
        let message = Message::parse(raw).unwrap();

        assert_eq!(message.from().as_deref(), Some("sender@example.com"));
        assert_eq!(
            message.headers().get_decoded("to").as_deref(),
            Some("recipient@example.com")
        );
        assert_eq!(message.subject().as_deref(), Some("Hi"));
        assert!(!message.is_multipart());
        assert_eq!(message.body_text(), "hi");
    }

    #[test]
    fn test_parse_lf_only() {
        let message = Message::parse(b"Subject: unix\n\nline one\nline two\n").unwrap();
        assert_eq!(message.subject().as_deref(), Some("unix"));
        assert_eq!(message.body_text(), "line one\nline two\n");
    }

    #[test]
    fn test_parse_without_headers() {
        let message = Message::parse(b"\r\njust a body").unwrap();
        assert!(message.headers().is_empty());
        assert_eq!(message.body_text(), "just a body");
    }

    #[test]
    fn test_parse_body_without_separator() {
        let message = Message::parse(b"Subject: x\r\nnot a header line\r\nmore").unwrap();
        assert_eq!(message.headers().len(), 1);
        assert_eq!(message.body_text(), "not a header line\r\nmore");
    }

    #[test]
    fn test_parse_headers_only() {
        let message = Message::parse(b"Subject: nothing else").unwrap();
        assert_eq!(message.subject().as_deref(), Some("nothing else"));
        assert_eq!(message.body_text(), "");
    }

    #[test]
    fn test_parse_empty() {
        let message = Message::parse(b"").unwrap();
        assert!(message.headers().is_empty());
        assert_eq!(message.body_text(), "");

        let message = Message::parse(b"\r\n\r\n").unwrap();
        assert!(message.headers().is_empty());
        assert_eq!(message.body_text(), "\r\n");
    }

    #[test]
    fn test_parse_nested_multipart() {
        let message = Message::parse(MULTIPART.as_bytes()).unwrap();
        assert!(message.is_multipart());

        let root = message.root();
        assert_eq!(root.parts().len(), 2);
        assert_eq!(root.parts()[0].parts().len(), 2);

        let essences: Vec<String> = message.walk().map(|p| p.content_type().essence()).collect();
        assert_eq!(
            essences,
            vec![
                "multipart/mixed",
                "multipart/alternative",
                "text/plain",
                "text/html",
                "application/octet-stream",
            ]
        );

        let text = message.walk().find(|p| p.content_type().is_text_plain()).unwrap();
        assert_eq!(text.body_text(), "café");

        let attachment = &root.parts()[1];
        assert_eq!(attachment.decode_body(), vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_multipart_missing_boundary() {
        let raw = b"Content-Type: multipart/mixed\r\nSubject: x\r\n\r\nhello";
        let message = Message::parse(raw).unwrap();
        assert!(!message.is_multipart());
        assert_eq!(message.walk().count(), 1);
        assert_eq!(message.body_text(), "hello");
    }

    #[test]
    fn test_parse_multipart_boundary_not_found() {
        let raw = b"Content-Type: multipart/mixed; boundary=abc\r\n\r\nno delimiters here\r\n";
        let message = Message::parse(raw).unwrap();
        assert!(!message.is_multipart());
        assert_eq!(message.body_text(), "no delimiters here\r\n");
        assert!(message.to_string().ends_with("\nno delimiters here\n"));
    }

    #[test]
    fn test_parse_multipart_unterminated() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\r\n\r\n--b\r\nContent-Type: text/plain\r\n\r\nlast part";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.root().parts().len(), 1);
        assert_eq!(message.root().parts()[0].body_text(), "last part");
    }

    #[test]
    fn test_parse_multipart_longer_boundary_is_not_delimiter() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\r\n\r\n--b\r\n\r\n--bb is text\r\n--b--\r\n";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.root().parts().len(), 1);
        assert_eq!(message.root().parts()[0].body_text(), "--bb is text");
    }

    #[test]
    fn test_parse_multipart_too_deep() {
        let mut raw = String::new();
        for level in 0..=MAX_DEPTH {
            raw.push_str(&format!(
                "Content-Type: multipart/mixed; boundary=b{level}\r\n\r\n--b{level}\r\n"
            ));
        }
        raw.push_str("\r\nleaf\r\n");
        assert!(matches!(
            Message::parse(raw.as_bytes()),
            Err(Error::InvalidMultipart(_))
        ));
    }

    #[test]
    fn test_display_round_trips_structure() {
        let message = Message::parse(MULTIPART.as_bytes()).unwrap();
        let rendered = message.to_string();

        assert!(rendered.starts_with("From: sender@example.com\nSubject: Report\n"));
        assert!(rendered.contains("--outer\nContent-Type: multipart/alternative"));
        assert!(rendered.contains("caf=E9"));
        assert!(rendered.ends_with("--outer--"));
        assert!(!rendered.contains('\r'));
        assert!(!rendered.contains("preamble"));

        let reparsed = Message::parse(rendered.as_bytes()).unwrap();
        assert_eq!(reparsed.walk().count(), message.walk().count());
    }

    #[test]
    fn test_display_single_part() {
        let message = Message::parse(b"Subject: Hi\r\n\r\nhello\r\n").unwrap();
        assert_eq!(message.to_string(), "Subject: Hi\n\nhello\n");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn parse_and_decode_never_panic(raw in proptest::collection::vec(any::<u8>(), 0..512)) {
                if let Ok(message) = Message::parse(&raw) {
                    for part in message.walk() {
                        let _ = part.body_text();
                    }
                    let _ = message.to_string();
                }
            }

            #[test]
            fn quoted_printable_never_grows(data in proptest::collection::vec(any::<u8>(), 0..256)) {
                prop_assert!(decode_quoted_printable(&data).len() <= data.len());
            }

            #[test]
            fn any_charset_label_decodes(label in "\\PC{0,20}", body in proptest::collection::vec(any::<u8>(), 0..64)) {
                let mut headers = Headers::new();
                headers.add("Content-Type", format!("text/plain; charset={label}"));
                let part = Part::new(headers, body);
                let _ = part.body_text();
            }
        }
    }
}
