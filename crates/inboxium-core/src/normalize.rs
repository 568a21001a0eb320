//! Envelope to message normalization.
//!
//! [`normalize`] is pure: the same envelope always yields the same
//! [`InboxMessage`]. Bad transfer encodings and unknown charsets are
//! substituted rather than reported; only a payload that cannot be parsed
//! as a MIME document at all is an error.

use crate::error::Result;
use crate::message::InboxMessage;
use inboxium_mime::Message as Document;
use inboxium_smtp::Envelope;

/// Converts a received envelope into an [`InboxMessage`].
///
/// Recipients come from the envelope as given. The sender is the envelope
/// sender unless that is empty, in which case the decoded `From` header is
/// used. A missing subject becomes the empty string.
///
/// # Errors
///
/// Returns [`Error::MalformedMessage`](crate::Error::MalformedMessage) if
/// multipart entities nest too deeply to parse. Empty payloads and broken
/// multipart structure are not errors; they yield empty or single-part text.
pub fn normalize(envelope: &Envelope) -> Result<InboxMessage> {
    let document = Document::parse(&envelope.content)?;

    let sender = if envelope.mail_from.is_empty() {
        document.from().unwrap_or_default()
    } else {
        envelope.mail_from.clone()
    };

    Ok(InboxMessage::new(sender)
        .with_recipients(envelope.rcpt_tos.iter().cloned())
        .with_subject(document.subject().unwrap_or_default())
        .with_text(extract_text(&document))
        .with_raw(document.to_string()))
}

/// Extracts the best plain-text body of a parsed document.
///
/// For multipart documents this is the first `text/plain` leaf in document
/// order, or the empty string if there is none. A single-part document is
/// decoded directly whatever its declared type. Never fails; undecodable
/// bytes become U+FFFD.
#[must_use]
pub fn extract_text(document: &Document) -> String {
    if !document.is_multipart() {
        return document.body_text();
    }

    document
        .walk()
        .find(|part| !part.is_multipart() && part.content_type().is_text_plain())
        .map(inboxium_mime::Part::body_text)
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::needless_collect)]
mod tests {
    use super::*;
    use crate::Error;

    fn envelope(from: &str, to: &[&str], content: &str) -> Envelope {
        to.iter().fold(
            Envelope::new(from).with_content(content.to_string()),
            |envelope, rcpt| envelope.with_recipient(*rcpt),
        )
    }

    #[test]
    fn test_normalize_simple() {
        let env = envelope(
            "bob@example.com",
            &["alice@example.com"],
            "Subject: =?utf-8?q?Hi?=\r\n\r\nhi",
        );

        let message = normalize(&env).unwrap();
        assert_eq!(message.sender(), "bob@example.com");
        assert_eq!(message.recipients(), ["alice@example.com"]);
        assert_eq!(message.subject(), "Hi");
        assert_eq!(message.text(), "hi");
        assert_eq!(message.raw(), "Subject: =?utf-8?q?Hi?=\n\nhi");
    }

    #[test]
    fn test_sender_falls_back_to_from_header() {
        let env = envelope(
            "",
            &["alice@example.com"],
            "From: =?iso-8859-1?q?Ren=E9?= <rene@example.com>\r\n\r\nsalut",
        );

        let message = normalize(&env).unwrap();
        assert_eq!(message.sender(), "René <rene@example.com>");
    }

    #[test]
    fn test_envelope_sender_wins_over_header() {
        let env = envelope(
            "bounce@example.com",
            &["alice@example.com"],
            "From: bob@example.com\r\n\r\nhi",
        );
        assert_eq!(normalize(&env).unwrap().sender(), "bounce@example.com");
    }

    #[test]
    fn test_missing_everything_is_empty() {
        let env = envelope("", &["alice@example.com"], "\r\nbody only");

        let message = normalize(&env).unwrap();
        assert_eq!(message.sender(), "");
        assert_eq!(message.subject(), "");
        assert_eq!(message.text(), "body only");
    }

    #[test]
    fn test_recipients_keep_order() {
        let env = envelope(
            "bob@example.com",
            &["c@example.com", "a@example.com", "c@example.com"],
            "Subject: x\r\n\r\nx",
        );
        assert_eq!(
            normalize(&env).unwrap().recipients(),
            ["c@example.com", "a@example.com", "c@example.com"]
        );
    }

    #[test]
    fn test_multipart_picks_first_text_plain() {
        let env = envelope(
            "bob@example.com",
            &["alice@example.com"],
            "Subject: report\r\n\
             Content-Type: multipart/mixed; boundary=\"outer\"\r\n\
             \r\n\
             preamble\r\n\
             --outer\r\n\
             Content-Type: multipart/alternative; boundary=inner\r\n\
             \r\n\
             --inner\r\n\
             Content-Type: text/plain; charset=iso-8859-1\r\n\
             Content-Transfer-Encoding: quoted-printable\r\n\
             \r\n\
             caf=E9\r\n\
             --inner\r\n\
             Content-Type: text/html\r\n\
             \r\n\
             <p>ignored</p>\r\n\
             --inner--\r\n\
             --outer\r\n\
             Content-Type: text/plain\r\n\
             \r\n\
             second\r\n\
             --outer--\r\n",
        );

        let message = normalize(&env).unwrap();
        assert_eq!(message.text(), "café");
        assert!(message.raw().contains("--outer--"));
    }

    #[test]
    fn test_multipart_without_text_plain() {
        let document = Document::parse(
            b"Content-Type: multipart/alternative; boundary=b\r\n\
              \r\n\
              --b\r\n\
              Content-Type: text/html\r\n\
              \r\n\
              <b>hi</b>\r\n\
              --b--\r\n",
        )
        .unwrap();
        assert_eq!(extract_text(&document), "");
    }

    #[test]
    fn test_base64_body() {
        let document = Document::parse(
            b"Content-Type: text/plain; charset=utf-8\r\n\
              Content-Transfer-Encoding: base64\r\n\
              \r\n\
              aMOpbGxv\r\n",
        )
        .unwrap();
        assert_eq!(extract_text(&document), "héllo");
    }

    #[test]
    fn test_unknown_charset_substitutes() {
        let document = Document::parse(
            b"Content-Type: text/plain; charset=x-no-such-thing\r\n\r\nok \xff",
        )
        .unwrap();
        assert_eq!(extract_text(&document), "ok \u{fffd}");
    }

    #[test]
    fn test_empty_payload() {
        let env = envelope("bob@example.com", &["alice@example.com"], "");

        let message = normalize(&env).unwrap();
        assert_eq!(message.sender(), "bob@example.com");
        assert_eq!(message.subject(), "");
        assert_eq!(message.text(), "");
    }

    #[test]
    fn test_missing_boundary_is_single_part() {
        let env = envelope(
            "bob@example.com",
            &["alice@example.com"],
            "Content-Type: multipart/mixed\r\nSubject: x\r\n\r\nhello",
        );

        let message = normalize(&env).unwrap();
        assert_eq!(message.subject(), "x");
        assert_eq!(message.text(), "hello");
    }

    #[test]
    fn test_boundary_never_used_is_single_part() {
        let env = envelope(
            "bob@example.com",
            &["alice@example.com"],
            "Content-Type: multipart/alternative; boundary=zzz\r\n\r\nplain words",
        );
        assert_eq!(normalize(&env).unwrap().text(), "plain words");
    }

    #[test]
    fn test_deep_nesting_is_malformed() {
        let mut content = String::new();
        for level in 0..40 {
            content.push_str(&format!(
                "Content-Type: multipart/mixed; boundary=b{level}\r\n\r\n--b{level}\r\n"
            ));
        }
        content.push_str("\r\nleaf\r\n");

        let env = envelope("bob@example.com", &["alice@example.com"], &content);
        assert!(matches!(normalize(&env), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn test_windows_1251_body() {
        let mut content = b"Subject: =?koi8-r?B?8NLJ18XU?=\r\n\
            Content-Type: text/plain; charset=windows-1251\r\n\r\n"
            .to_vec();
        content.extend_from_slice(b"\xcf\xf0\xe8\xe2\xe5\xf2");
        let env = Envelope::new("ivan@example.ru")
            .with_recipient("olga@example.ru")
            .with_content(content);

        let message = normalize(&env).unwrap();
        assert_eq!(message.subject(), "Привет");
        assert_eq!(message.text(), "Привет");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalize_is_pure(
                from in "[a-z]{0,8}(@[a-z]{1,8}\\.test)?",
                subject in "[ -~]{0,40}",
                body in "[ -~\\r\\n]{0,200}",
            ) {
                let content = format!("Subject: {subject}\r\n\r\n{body}");
                let env = envelope(&from, &["alice@example.com"], &content);
                let first = normalize(&env);
                let second = normalize(&env);
                match (first, second) {
                    (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                    (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
                    _ => prop_assert!(false, "normalize gave different outcomes"),
                }
            }

            #[test]
            fn extract_text_is_total(
                charset in "[a-zA-Z0-9_*'-]{0,20}",
                encoding in prop::sample::select(vec!["7bit", "base64", "quoted-printable", "x-bogus"]),
                body in prop::collection::vec(any::<u8>(), 1..200),
            ) {
                let mut raw = format!(
                    "Content-Type: text/plain; charset={charset}\r\n\
                     Content-Transfer-Encoding: {encoding}\r\n\r\n"
                )
                .into_bytes();
                raw.extend_from_slice(&body);
                if let Ok(document) = Document::parse(&raw) {
                    let _ = extract_text(&document);
                }
            }
        }
    }
}
