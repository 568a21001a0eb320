//! Error types for the core library.

use thiserror::Error;

/// Boxed error carried by a failed handler.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while receiving a message.
#[derive(Debug, Error)]
pub enum Error {
    /// The payload could not be parsed as a MIME document.
    #[error("Malformed message: {0}")]
    MalformedMessage(#[from] inboxium_mime::Error),

    /// A handler returned an error or panicked; the rest of the dispatch
    /// was skipped.
    #[error("Handler #{index} ({label}) failed: {source}", label = .name.as_deref().unwrap_or("unnamed"))]
    HandlerFailure {
        /// Registration index of the failing handler.
        index: usize,
        /// Handler name, if one was given.
        name: Option<String>,
        /// What the handler reported.
        #[source]
        source: BoxError,
    },

    /// The SMTP listener failed.
    #[error("SMTP error: {0}")]
    Smtp(#[from] inboxium_smtp::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
