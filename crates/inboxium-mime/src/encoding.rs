//! MIME decoding utilities.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header decoding. The
//! body and header decoders are lenient: malformed input is passed through
//! or substituted, never rejected.

use crate::charset;
use crate::error::Result;
use base64::Engine;
use base64::alphabet;
use base64::engine::DecodePaddingMode;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};

/// Base64 engine that accepts missing padding and stray trailing bits.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decodes strict Base64 data.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    STANDARD.decode(data).map_err(Into::into)
}

/// Decodes Base64 body data, skipping anything outside the alphabet.
///
/// Line breaks, padding and junk characters are ignored. A dangling final
/// character that cannot form a byte is dropped.
#[must_use]
pub fn decode_base64_lenient(data: &[u8]) -> Vec<u8> {
    let mut cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| b.is_ascii_alphanumeric() || *b == b'+' || *b == b'/')
        .collect();

    if cleaned.len() % 4 == 1 {
        cleaned.pop();
    }

    LENIENT
        .decode(&cleaned)
        .unwrap_or_else(|_| data.to_vec())
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks are removed. An `=` that does not start a valid escape
/// is kept literally.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        let rest = &data[i + 1..];

        // Soft line break, possibly preceded by transport padding
        let padding = rest
            .iter()
            .take_while(|b| matches!(b, b' ' | b'\t'))
            .count();
        match rest.get(padding) {
            Some(b'\n') => {
                i += padding + 2;
                continue;
            }
            Some(b'\r') if rest.get(padding + 1) == Some(&b'\n') => {
                i += padding + 3;
                continue;
            }
            _ => {}
        }

        match (
            rest.first().copied().and_then(hex_value),
            rest.get(1).copied().and_then(hex_value),
        ) {
            (Some(high), Some(low)) => {
                result.push((high << 4) | low);
                i += 3;
            }
            _ => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    result
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Decodes every RFC 2047 encoded-word in a header value.
///
/// Format of a word: `=?charset?encoding?encoded-text?=`
///
/// Whitespace between two adjacent encoded-words is dropped, as RFC 2047
/// section 6.2 requires. Words that are malformed or use an unknown encoding
/// are left as they are.
#[must_use]
pub fn decode_rfc2047(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let (before, candidate) = rest.split_at(start);

        if let Some((decoded, consumed)) = decode_encoded_word(candidate) {
            if !(after_word && before.chars().all(char::is_whitespace)) {
                result.push_str(before);
            }
            result.push_str(&decoded);
            rest = &candidate[consumed..];
            after_word = true;
        } else {
            result.push_str(before);
            result.push_str("=?");
            rest = &candidate[2..];
            after_word = false;
        }
    }

    result.push_str(rest);
    result
}

/// Decodes one encoded-word at the start of `text`.
///
/// Returns the decoded text and the number of bytes consumed.
fn decode_encoded_word(text: &str) -> Option<(String, usize)> {
    let inner = text.strip_prefix("=?")?;
    let (charset, rest) = inner.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let encoded = &rest[..end];

    if charset.is_empty()
        || charset.contains(char::is_whitespace)
        || encoded.contains(char::is_whitespace)
    {
        return None;
    }

    let bytes = match encoding {
        "B" | "b" => decode_base64_lenient(encoded.as_bytes()),
        "Q" | "q" => decode_quoted_printable(encoded.replace('_', " ").as_bytes()),
        _ => return None,
    };

    // RFC 2231 allows a language suffix: =?utf-8*en?Q?...?=
    let label = charset.split('*').next().unwrap_or(charset);
    let consumed = 2 + charset.len() + 1 + encoding.len() + 1 + end + 2;

    Some((charset::decode(&bytes, Some(label)), consumed))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_decode() {
        let decoded = decode_base64("SGVsbG8sIFdvcmxkIQ==").unwrap();
        assert_eq!(decoded, b"Hello, World!");
        assert!(decode_base64("not base64!").is_err());
    }

    #[test]
    fn test_base64_lenient_line_breaks() {
        let decoded = decode_base64_lenient(b"SGVsbG8s\r\nIFdvcmxk\r\nIQ==\r\n");
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_base64_lenient_missing_padding() {
        assert_eq!(decode_base64_lenient(b"SGk"), b"Hi");
    }

    #[test]
    fn test_base64_lenient_dangling_char() {
        assert_eq!(decode_base64_lenient(b"SGkh\r\nQ"), b"Hi!");
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(decode_quoted_printable(b"Hello, World!"), b"Hello, World!");
        assert_eq!(decode_quoted_printable(b"H=C3=A9llo"), "Héllo".as_bytes());
        assert_eq!(decode_quoted_printable(b"caf=e9"), b"caf\xe9");
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(decode_quoted_printable(b"Hello=\r\nWorld"), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"Hello=\nWorld"), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"Hello=  \r\nWorld"), b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_malformed_escape_kept() {
        assert_eq!(decode_quoted_printable(b"100=%"), b"100=%");
        assert_eq!(decode_quoted_printable(b"trailing="), b"trailing=");
        assert_eq!(decode_quoted_printable(b"=G1"), b"=G1");
    }

    #[test]
    fn test_rfc2047_plain_passthrough() {
        assert_eq!(decode_rfc2047("Hello"), "Hello");
        assert_eq!(decode_rfc2047(""), "");
    }

    #[test]
    fn test_rfc2047_base64() {
        assert_eq!(decode_rfc2047("=?utf-8?B?SMOpbGxv?="), "Héllo");
    }

    #[test]
    fn test_rfc2047_quoted_printable() {
        assert_eq!(decode_rfc2047("=?utf-8?Q?H=C3=A9llo?="), "Héllo");
        assert_eq!(decode_rfc2047("=?utf-8?q?Hi?="), "Hi");
        assert_eq!(decode_rfc2047("=?UTF-8?Q?two_words?="), "two words");
    }

    #[test]
    fn test_rfc2047_adjacent_words_join() {
        let value = "=?utf-8?Q?Caf?= =?utf-8?Q?=C3=A9?=";
        assert_eq!(decode_rfc2047(value), "Café");
    }

    #[test]
    fn test_rfc2047_mixed_with_plain_text() {
        let value = "Re: =?iso-8859-1?Q?caf=E9?= tonight";
        assert_eq!(decode_rfc2047(value), "Re: café tonight");
    }

    #[test]
    fn test_rfc2047_language_suffix() {
        assert_eq!(decode_rfc2047("=?utf-8*en?Q?hi?="), "hi");
    }

    #[test]
    fn test_rfc2047_malformed_left_literal() {
        assert_eq!(decode_rfc2047("=?utf-8?X?abc?="), "=?utf-8?X?abc?=");
        assert_eq!(decode_rfc2047("=?broken"), "=?broken");
        assert_eq!(decode_rfc2047("a =? b"), "a =? b");
    }

    #[test]
    fn test_rfc2047_unknown_charset_decodes_as_utf8() {
        assert_eq!(decode_rfc2047("=?x-unknown?Q?ok?="), "ok");
    }

    #[test]
    fn test_rfc2047_koi8_r() {
        assert_eq!(decode_rfc2047("=?koi8-r?B?8NLJ18XU?="), "Привет");
    }

    #[test]
    fn test_rfc2047_windows_1251_quoted_printable() {
        assert_eq!(
            decode_rfc2047("=?windows-1251?Q?=CF=F0=E8=E2=E5=F2,_=EC=E8=F0?="),
            "Привет, мир"
        );
    }
}
