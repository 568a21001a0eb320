//! Session callbacks.
//!
//! A [`SessionHandler`] decides what happens to each recipient and each
//! completed message. One handler instance is shared by every session, so
//! callbacks may run concurrently.
//!
//! # Example
//!
//! ```ignore
//! use inboxium_smtp::{Envelope, Reply, SessionHandler};
//!
//! struct Discard;
//!
//! impl SessionHandler for Discard {
//!     async fn on_data(&self, envelope: &Envelope) -> Reply {
//!         println!("{} bytes from {}", envelope.content.len(), envelope.mail_from);
//!         Reply::ok()
//!     }
//! }
//! ```

use crate::types::{Envelope, Reply};
use std::future::{self, Future};

/// Callbacks invoked by a session during a mail transaction.
pub trait SessionHandler: Send + Sync + 'static {
    /// Called for each syntactically valid `RCPT TO`.
    ///
    /// The reply is sent to the client as is. The session counts the
    /// recipient as accepted only if the reply is 2xx. The default appends
    /// the address to the envelope and accepts it.
    fn on_recipient(
        &self,
        envelope: &mut Envelope,
        address: &str,
    ) -> impl Future<Output = Reply> + Send {
        envelope.rcpt_tos.push(address.to_string());
        future::ready(Reply::ok())
    }

    /// Called once the DATA payload has been received in full.
    ///
    /// The reply is sent to the client as is and the transaction is reset
    /// afterwards.
    fn on_data(&self, envelope: &Envelope) -> impl Future<Output = Reply> + Send;
}
