//! SMTP reply types.

use std::fmt;

/// SMTP reply sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code (e.g., 250).
    pub code: ReplyCode,
    /// Reply message lines.
    pub message: Vec<String>,
}

impl Reply {
    /// Creates a new reply.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Vec is not const-compatible
    pub fn new(code: ReplyCode, message: Vec<String>) -> Self {
        Self { code, message }
    }

    /// Creates a single-line reply.
    #[must_use]
    pub fn single(code: ReplyCode, text: impl Into<String>) -> Self {
        Self::new(code, vec![text.into()])
    }

    /// Creates `250 OK`.
    #[must_use]
    pub fn ok() -> Self {
        Self::single(ReplyCode::OK, "OK")
    }

    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient_error(&self) -> bool {
        self.code.is_transient()
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent_error(&self) -> bool {
        self.code.is_permanent()
    }

    /// Returns the full message as a single string.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.message.join("\n")
    }
}

/// Writes the reply in wire format, CRLF-terminated.
///
/// Multi-line replies use `-` after the code on every line but the last.
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((last, rest)) = self.message.split_last() else {
            return write!(f, "{}\r\n", self.code);
        };
        for line in rest {
            write!(f, "{}-{line}\r\n", self.code)?;
        }
        write!(f, "{} {last}\r\n", self.code)
    }
}

/// Three-digit SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Wraps a numeric code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns the first digit, which classifies the reply.
    #[must_use]
    pub const fn class(self) -> u16 {
        self.0 / 100
    }

    /// 2yz: the command succeeded.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.class() == 2
    }

    /// 3yz: the server waits for more input.
    #[must_use]
    pub const fn is_intermediate(self) -> bool {
        self.class() == 3
    }

    /// 4yz: the client may retry later.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.class() == 4
    }

    /// 5yz: the client should not retry.
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.class() == 5
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.0)
    }
}

impl ReplyCode {
    /// 220, sent as the greeting.
    pub const SERVICE_READY: Self = Self(220);
    /// 221, answer to QUIT.
    pub const CLOSING: Self = Self(221);
    /// 250, command completed.
    pub const OK: Self = Self(250);
    /// 252, answer to VRFY.
    pub const CANNOT_VERIFY: Self = Self(252);
    /// 354, start of the DATA payload.
    pub const START_DATA: Self = Self(354);
    /// 421, the session is being closed (idle timeout).
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// 451, local I/O failure.
    pub const LOCAL_ERROR: Self = Self(451);
    /// 500, unknown command or over-long line.
    pub const SYNTAX_ERROR: Self = Self(500);
    /// 500, the message could not be processed after DATA.
    ///
    /// Shares its value with [`Self::SYNTAX_ERROR`]; clients see the same code.
    pub const INTERNAL_ERROR: Self = Self(500);
    /// 501, malformed arguments.
    pub const PARAMETER_ERROR: Self = Self(501);
    /// 502, recognized but unsupported command.
    pub const NOT_IMPLEMENTED: Self = Self(502);
    /// 503, command out of sequence.
    pub const BAD_SEQUENCE: Self = Self(503);
    /// 550, mailbox refused.
    pub const MAILBOX_UNAVAILABLE: Self = Self(550);
    /// 552, message over the size limit.
    pub const EXCEEDED_STORAGE: Self = Self(552);
    /// 553, unusable mailbox name.
    pub const MAILBOX_NAME_INVALID: Self = Self(553);
    /// 554, transaction failed.
    pub const TRANSACTION_FAILED: Self = Self(554);
    /// 555, unknown MAIL or RCPT parameter.
    pub const PARAMETERS_NOT_RECOGNIZED: Self = Self(555);
}
