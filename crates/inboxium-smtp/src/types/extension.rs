//! SMTP extension types.

use std::fmt;

/// Service extensions listed in the EHLO response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// SIZE - Maximum message size
    Size(Option<usize>),
    /// 8BITMIME - 8-bit MIME transport
    EightBitMime,
    /// PIPELINING - Command pipelining
    Pipelining,
    /// SMTPUTF8 - UTF-8 email addresses
    SmtpUtf8,
    /// Unknown extension
    Unknown(String),
}

impl Extension {
    /// Returns the extensions this receiver advertises.
    #[must_use]
    pub fn advertised(max_message_size: usize) -> Vec<Self> {
        vec![
            Self::EightBitMime,
            Self::Size(Some(max_message_size)),
            Self::Pipelining,
            Self::SmtpUtf8,
        ]
    }

    /// Parses an extension line from an EHLO response.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            return Self::Unknown(line.to_string());
        }

        let keyword = parts[0].to_uppercase();
        match keyword.as_str() {
            "SIZE" => {
                let size = parts.get(1).and_then(|s| s.parse().ok());
                Self::Size(size)
            }
            "8BITMIME" => Self::EightBitMime,
            "PIPELINING" => Self::Pipelining,
            "SMTPUTF8" => Self::SmtpUtf8,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size(Some(size)) => write!(f, "SIZE {size}"),
            Self::Size(None) => f.write_str("SIZE"),
            Self::EightBitMime => f.write_str("8BITMIME"),
            Self::Pipelining => f.write_str("PIPELINING"),
            Self::SmtpUtf8 => f.write_str("SMTPUTF8"),
            Self::Unknown(line) => f.write_str(line),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_with_value() {
        assert_eq!(Extension::parse("SIZE 52428800"), Extension::Size(Some(52_428_800)));
    }

    #[test]
    fn parse_size_without_value() {
        assert_eq!(Extension::parse("size"), Extension::Size(None));
    }

    #[test]
    fn parse_keywords() {
        assert_eq!(Extension::parse("8BITMIME"), Extension::EightBitMime);
        assert_eq!(Extension::parse("pipelining"), Extension::Pipelining);
        assert_eq!(Extension::parse("SMTPUTF8"), Extension::SmtpUtf8);
    }

    #[test]
    fn parse_unknown() {
        assert_eq!(
            Extension::parse("STARTTLS"),
            Extension::Unknown("STARTTLS".to_string())
        );
        assert!(matches!(Extension::parse(""), Extension::Unknown(_)));
    }

    #[test]
    fn advertised_lines_parse_back() {
        for ext in Extension::advertised(1024) {
            assert_eq!(Extension::parse(&ext.to_string()), ext);
        }
    }

    #[test]
    fn display() {
        assert_eq!(Extension::Size(Some(1024)).to_string(), "SIZE 1024");
        assert_eq!(Extension::EightBitMime.to_string(), "8BITMIME");
    }
}
