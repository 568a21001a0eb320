//! Error types for SMTP sessions.

use crate::types::{Reply, ReplyCode};
use std::io;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Command verb not recognized.
    #[error("Unrecognized command: {0}")]
    UnknownCommand(String),

    /// Command arguments are malformed.
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// MAIL or RCPT parameter the server does not implement.
    #[error("Unsupported parameter: {0}")]
    UnsupportedParameter(String),

    /// Command line exceeds the configured limit.
    #[error("Line exceeds {0} bytes")]
    LineTooLong(usize),

    /// Message exceeds the configured size limit.
    #[error("Message exceeds size limit: {0} bytes")]
    MessageTooLarge(usize),
}

impl Error {
    /// Returns the reply sent to the client for this error.
    #[must_use]
    pub fn to_reply(&self) -> Reply {
        match self {
            Self::Io(_) => Reply::single(ReplyCode::LOCAL_ERROR, "Local error in processing"),
            Self::UnknownCommand(_) => {
                Reply::single(ReplyCode::SYNTAX_ERROR, "Error: command not recognized")
            }
            Self::Syntax(message) => {
                Reply::single(ReplyCode::PARAMETER_ERROR, format!("Syntax: {message}"))
            }
            Self::InvalidAddress(_) => {
                Reply::single(ReplyCode::MAILBOX_NAME_INVALID, "Error: malformed address")
            }
            Self::UnsupportedParameter(_) => Reply::single(
                ReplyCode::PARAMETERS_NOT_RECOGNIZED,
                "Error: parameters not recognized",
            ),
            Self::LineTooLong(_) => Reply::single(ReplyCode::SYNTAX_ERROR, "Error: line too long"),
            Self::MessageTooLarge(_) => Reply::single(
                ReplyCode::EXCEEDED_STORAGE,
                "Error: message exceeds fixed maximum message size",
            ),
        }
    }

    /// Returns true if the session can continue after replying.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}
