//! # inboxium-core
//!
//! Turns received SMTP envelopes into structured messages and routes them to
//! application handlers.
//!
//! This crate provides:
//! - **Normalization** - envelope to [`InboxMessage`] with decoded headers
//!   and a plain-text body
//! - **Routing** - ordered [`Route`]s of [`Predicate`] and [`Handler`], with
//!   blocking and pass-through matches
//! - **Inbox** - the [`SessionHandler`](inboxium_smtp::SessionHandler) that
//!   ties both to an SMTP listener
//!
//! ## Dispatch
//!
//! Routes are evaluated in registration order. A predicate with no field set
//! matches every message; otherwise any set field that equals the message's
//! value is a match (or every set field, with [`MatchMode::All`]). A matching
//! blocking route ends dispatch, and a failing handler aborts it.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod inbox;
mod message;
pub mod normalize;
pub mod router;

pub use error::{BoxError, Error, Result};
pub use inbox::Inbox;
pub use message::InboxMessage;
pub use normalize::{extract_text, normalize};
pub use router::{Fields, Handler, MatchMode, Outcome, Predicate, Route, Router};
