//! Character set decoding.
//!
//! Labels are resolved with the WHATWG encoding registry, so every charset
//! seen in real mail (KOI8-R, Windows-125x, ISO-8859-x, Shift_JIS, GBK, ...)
//! is understood. An unknown or malformed label decodes as UTF-8. Undecodable
//! byte sequences always become U+FFFD, so decoding is total.

use encoding_rs::{Encoding, REPLACEMENT, UTF_8};
use std::borrow::Cow;

/// A resolved character set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset(&'static Encoding);

impl Default for Charset {
    fn default() -> Self {
        Self(UTF_8)
    }
}

impl Charset {
    /// Resolves a charset label (case-insensitive, quotes tolerated).
    ///
    /// Returns `None` for labels that are not recognized.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().trim_matches('"').replace('_', "-");
        Encoding::for_label(label.as_bytes())
            .filter(|&encoding| encoding != REPLACEMENT)
            .map(Self)
    }

    /// Returns the canonical name, e.g. `windows-1251`.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.0.name()
    }

    /// Decodes bytes in this charset, replacing invalid sequences.
    ///
    /// A byte order mark is kept as data rather than switching encodings.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        self.0.decode_without_bom_handling(bytes).0.into_owned()
    }
}

/// Decodes bytes using an optional charset label.
///
/// A missing or unknown label decodes as UTF-8.
#[must_use]
pub fn decode(bytes: &[u8], label: Option<&str>) -> String {
    label
        .and_then(Charset::from_label)
        .unwrap_or_default()
        .decode(bytes)
}

/// Decodes bytes as UTF-8 without copying when they are already valid.
#[must_use]
pub fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::unreadable_literal)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Charset::from_label("UTF-8").unwrap().name(), "UTF-8");
        assert_eq!(Charset::from_label("\"KOI8-R\"").unwrap().name(), "KOI8-R");
        assert_eq!(Charset::from_label("Windows_1251").unwrap().name(), "windows-1251");
        assert_eq!(Charset::from_label(" cp1251 ").unwrap().name(), "windows-1251");
        assert_eq!(Charset::from_label("x-no-such-thing"), None);
        assert_eq!(Charset::from_label(""), None);
    }

    #[test]
    fn test_replacement_labels_are_unknown() {
        assert_eq!(Charset::from_label("iso-2022-kr"), None);
    }

    #[test]
    fn test_windows_1251() {
        assert_eq!(
            decode(b"\xcf\xf0\xe8\xe2\xe5\xf2", Some("windows-1251")),
            "Привет"
        );
    }

    #[test]
    fn test_koi8_r() {
        assert_eq!(decode(b"\xf0\xd2\xc9\xd7\xc5\xd4", Some("koi8-r")), "Привет");
    }

    #[test]
    fn test_latin1() {
        assert_eq!(decode(b"caf\xe9", Some("iso-8859-1")), "café");
    }

    #[test]
    fn test_windows_1252_high_range() {
        assert_eq!(decode(b"\x93quoted\x94 \x80", Some("cp1252")), "\u{201C}quoted\u{201D} €");
    }

    #[test]
    fn test_multi_byte() {
        assert_eq!(decode(b"\x93\xfa\x96\x7b", Some("shift_jis")), "日本");
    }

    #[test]
    fn test_utf8_replaces_invalid() {
        assert_eq!(decode(b"ok \xff", Some("utf-8")), "ok \u{FFFD}");
    }

    #[test]
    fn test_unknown_label_falls_back_to_utf8() {
        assert_eq!(decode("héllo".as_bytes(), Some("x-no-such-charset")), "héllo");
        assert_eq!(decode(b"bad \xff", Some("!!!")), "bad \u{FFFD}");
        assert_eq!(decode(b"plain", None), "plain");
    }
}
