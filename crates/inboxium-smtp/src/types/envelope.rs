//! SMTP envelope.

use bytes::Bytes;

/// Per-transaction delivery data gathered by a session.
///
/// `mail_from` is empty for the null reverse path `<>`. Recipients are kept
/// in the order the client sent them; `content` is the dot-unstuffed DATA
/// payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// Declared sender from `MAIL FROM`.
    pub mail_from: String,
    /// Recipients accepted so far.
    pub rcpt_tos: Vec<String>,
    /// Raw message payload.
    pub content: Bytes,
    /// Whether the client requested `SMTPUTF8`.
    pub smtputf8: bool,
}

impl Envelope {
    /// Creates an envelope for the given sender.
    #[must_use]
    pub fn new(mail_from: impl Into<String>) -> Self {
        Self {
            mail_from: mail_from.into(),
            ..Self::default()
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn with_recipient(mut self, address: impl Into<String>) -> Self {
        self.rcpt_tos.push(address.into());
        self
    }

    /// Sets the message payload.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<Bytes>) -> Self {
        self.content = content.into();
        self
    }
}
