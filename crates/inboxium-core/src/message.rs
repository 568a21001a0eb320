//! Normalized inbound message.

/// A received message with decoded headers and a plain-text body.
///
/// Every field is a string; a missing value is the empty string. Values are
/// fixed at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InboxMessage {
    recipients: Vec<String>,
    sender: String,
    subject: String,
    text: String,
    raw: String,
}

impl InboxMessage {
    /// Creates a message from a sender with every other field empty.
    #[must_use]
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            ..Self::default()
        }
    }

    /// Adds a recipient.
    #[must_use]
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipients.push(recipient.into());
        self
    }

    /// Replaces the recipient list.
    #[must_use]
    pub fn with_recipients<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipients = recipients.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the plain-text body.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the serialized source.
    #[must_use]
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    /// Recipients accepted during the transaction, in order.
    #[must_use]
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Sender address.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Decoded subject.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Best-effort plain-text body.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Serialized source of the parsed message.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let message = InboxMessage::new("bob@example.com")
            .with_recipient("alice@example.com")
            .with_recipient("carol@example.com")
            .with_subject("Hi")
            .with_text("hi")
            .with_raw("Subject: Hi\n\nhi");

        assert_eq!(message.sender(), "bob@example.com");
        assert_eq!(message.recipients(), ["alice@example.com", "carol@example.com"]);
        assert_eq!(message.subject(), "Hi");
        assert_eq!(message.text(), "hi");
        assert_eq!(message.raw(), "Subject: Hi\n\nhi");
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let message = InboxMessage::default();
        assert_eq!(message.sender(), "");
        assert_eq!(message.subject(), "");
        assert!(message.recipients().is_empty());
    }

    #[test]
    fn test_with_recipients_replaces() {
        let message = InboxMessage::new("")
            .with_recipient("old@example.com")
            .with_recipients(["a@example.com", "b@example.com"]);
        assert_eq!(message.recipients(), ["a@example.com", "b@example.com"]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize() {
        let message = InboxMessage::new("bob@example.com").with_recipient("alice@example.com");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["sender"], "bob@example.com");
        assert_eq!(json["recipients"][0], "alice@example.com");
        assert_eq!(json["subject"], "");
    }
}
