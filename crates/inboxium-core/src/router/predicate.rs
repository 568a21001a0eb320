//! Content predicates.

use crate::message::InboxMessage;

/// How the set fields of a [`Predicate`] combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// At least one set field must match.
    #[default]
    Any,
    /// Every set field must match.
    All,
}

/// Exact-match constraints on message fields.
///
/// A predicate with no field set is a wildcard and matches every message.
/// A field set to the empty string is still set, and matches a message whose
/// value is missing.
///
/// # Example
///
/// ```ignore
/// use inboxium_core::Predicate;
///
/// // Matches mail from alice, or anything titled "invoice"
/// let predicate = Predicate::new()
///     .sender("alice@example.com")
///     .subject("invoice");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    recipient: Option<String>,
    sender: Option<String>,
    subject: Option<String>,
    text: Option<String>,
    mode: MatchMode,
}

impl Predicate {
    /// Creates a wildcard predicate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches when any accepted recipient equals `recipient`.
    #[must_use]
    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// Matches the sender.
    #[must_use]
    pub fn sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Matches the decoded subject.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Matches the extracted body text.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets how set fields combine.
    #[must_use]
    pub const fn mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Requires every set field to match.
    #[must_use]
    pub const fn all(self) -> Self {
        self.mode(MatchMode::All)
    }

    /// Returns the match mode.
    #[must_use]
    pub const fn match_mode(&self) -> MatchMode {
        self.mode
    }

    /// Checks if no field is set.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        self.recipient.is_none()
            && self.sender.is_none()
            && self.subject.is_none()
            && self.text.is_none()
    }

    /// Evaluates the predicate against a message.
    #[must_use]
    pub fn matches(&self, message: &InboxMessage) -> bool {
        let checks = [
            self.recipient
                .as_deref()
                .map(|want| message.recipients().iter().any(|r| r == want)),
            self.sender.as_deref().map(|want| message.sender() == want),
            self.subject.as_deref().map(|want| message.subject() == want),
            self.text.as_deref().map(|want| message.text() == want),
        ];
        let mut set = checks.into_iter().flatten().peekable();

        if set.peek().is_none() {
            return true;
        }

        match self.mode {
            MatchMode::Any => set.any(|hit| hit),
            MatchMode::All => set.all(|hit| hit),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn message() -> InboxMessage {
        InboxMessage::new("a@x.test")
            .with_recipient("alice@example.com")
            .with_recipient("carol@example.com")
            .with_subject("goodbye")
            .with_text("hi")
    }

    #[test]
    fn test_wildcard() {
        let predicate = Predicate::new();
        assert!(predicate.is_wildcard());
        assert!(predicate.matches(&message()));
        assert!(predicate.matches(&InboxMessage::default()));
        assert!(predicate.all().matches(&InboxMessage::default()));
    }

    #[test]
    fn test_any_field_is_enough() {
        let predicate = Predicate::new().sender("a@x.test").subject("hello");
        assert!(!predicate.is_wildcard());
        assert!(predicate.matches(&message()));
    }

    #[test]
    fn test_no_field_matches() {
        let predicate = Predicate::new().sender("b@x.test").subject("hello");
        assert!(!predicate.matches(&message()));
    }

    #[test]
    fn test_all_mode() {
        let predicate = Predicate::new().sender("a@x.test").subject("hello").all();
        assert_eq!(predicate.match_mode(), MatchMode::All);
        assert!(!predicate.matches(&message()));

        let predicate = Predicate::new().sender("a@x.test").subject("goodbye").all();
        assert!(predicate.matches(&message()));
    }

    #[test]
    fn test_recipient_matches_any_accepted() {
        assert!(Predicate::new().recipient("carol@example.com").matches(&message()));
        assert!(!Predicate::new().recipient("dave@example.com").matches(&message()));
    }

    #[test]
    fn test_matching_is_exact() {
        assert!(!Predicate::new().subject("Goodbye").matches(&message()));
        assert!(!Predicate::new().text("h").matches(&message()));
        assert!(Predicate::new().text("hi").matches(&message()));
    }

    #[test]
    fn test_empty_string_matches_missing_field() {
        let predicate = Predicate::new().subject("");
        assert!(!predicate.is_wildcard());
        assert!(predicate.matches(&InboxMessage::new("a@x.test")));
        assert!(!predicate.matches(&message()));
    }
}
