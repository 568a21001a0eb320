//! SMTP commands accepted by the receiver.

use crate::types::Address;
use std::fmt;

/// SMTP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// HELO - Simple greeting
    Helo {
        /// Client hostname
        hostname: String,
    },
    /// EHLO - Extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// MAIL FROM - Start mail transaction
    MailFrom {
        /// Sender address, `None` for the null path `<>`
        from: Option<Address>,
        /// BODY parameter (7BIT, 8BITMIME)
        body: Option<String>,
        /// SIZE parameter
        size: Option<usize>,
        /// SMTPUTF8 parameter
        smtputf8: bool,
    },
    /// RCPT TO - Add recipient
    RcptTo {
        /// Recipient address
        to: Address,
    },
    /// DATA - Begin message data
    Data,
    /// RSET - Reset transaction
    Rset,
    /// VRFY - Verify address
    Vrfy {
        /// Address to verify
        address: String,
    },
    /// NOOP - No operation
    Noop,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Returns the command verb.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Helo { .. } => "HELO",
            Self::Ehlo { .. } => "EHLO",
            Self::MailFrom { .. } => "MAIL",
            Self::RcptTo { .. } => "RCPT",
            Self::Data => "DATA",
            Self::Rset => "RSET",
            Self::Vrfy { .. } => "VRFY",
            Self::Noop => "NOOP",
            Self::Quit => "QUIT",
        }
    }
}

/// Writes the command as a client would send it, without the CRLF.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Helo { hostname } => write!(f, "HELO {hostname}"),
            Self::Ehlo { hostname } => write!(f, "EHLO {hostname}"),
            Self::MailFrom {
                from,
                body,
                size,
                smtputf8,
            } => {
                f.write_str("MAIL FROM:<")?;
                if let Some(from) = from {
                    write!(f, "{from}")?;
                }
                f.write_str(">")?;
                if let Some(body_type) = body {
                    write!(f, " BODY={body_type}")?;
                }
                if let Some(msg_size) = size {
                    write!(f, " SIZE={msg_size}")?;
                }
                if *smtputf8 {
                    f.write_str(" SMTPUTF8")?;
                }
                Ok(())
            }
            Self::RcptTo { to } => write!(f, "RCPT TO:<{to}>"),
            Self::Vrfy { address } => write!(f, "VRFY {address}"),
            Self::Data | Self::Rset | Self::Noop | Self::Quit => f.write_str(self.verb()),
        }
    }
}
