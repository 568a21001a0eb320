//! Envelope address types.

use crate::error::{Error, Result};

/// Email address from an SMTP envelope path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        Self::validate(&addr)?;
        Ok(Self(addr))
    }

    /// Parses a reverse or forward path argument.
    ///
    /// Accepts `<local@domain>`, a bare `local@domain`, and drops an
    /// obsolete source route (`<@relay,@relay:local@domain>`). The null
    /// path `<>` yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the brackets are unbalanced or the address is
    /// invalid.
    pub fn parse_path(path: &str) -> Result<Option<Self>> {
        let path = path.trim();
        let inner = match path.strip_prefix('<') {
            Some(rest) => rest
                .strip_suffix('>')
                .ok_or_else(|| Error::InvalidAddress(format!("Unbalanced brackets: {path}")))?,
            None => path,
        };

        if inner.is_empty() {
            return if path == "<>" {
                Ok(None)
            } else {
                Err(Error::InvalidAddress("Address cannot be empty".into()))
            };
        }

        let mailbox = match inner.strip_prefix('@') {
            Some(route) => route
                .split_once(':')
                .map(|(_, mailbox)| mailbox)
                .ok_or_else(|| Error::InvalidAddress(format!("Bad source route: {inner}")))?,
            None => inner,
        };

        Self::new(mailbox).map(Some)
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the special `postmaster` recipient.
    #[must_use]
    pub fn is_postmaster(&self) -> bool {
        self.0.eq_ignore_ascii_case("postmaster")
    }

    /// Validates an email address (basic validation).
    fn validate(addr: &str) -> Result<()> {
        if addr.is_empty() {
            return Err(Error::InvalidAddress("Address cannot be empty".into()));
        }

        if addr.chars().any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>') {
            return Err(Error::InvalidAddress(format!(
                "Address contains forbidden characters: {addr}"
            )));
        }

        if addr.eq_ignore_ascii_case("postmaster") {
            return Ok(());
        }

        // Quoted local parts may contain '@'
        let Some((local, domain)) = addr.rsplit_once('@') else {
            return Err(Error::InvalidAddress("Address must contain @".into()));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(
                "Local and domain parts cannot be empty".into(),
            ));
        }

        if domain.contains('@') {
            return Err(Error::InvalidAddress(
                "Address must have exactly one @".into(),
            ));
        }

        Ok(())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
