//! # inboxium-smtp
//!
//! The receiving side of RFC 5321: a plaintext SMTP listener that hands each
//! recipient and each completed message to a [`SessionHandler`].
//!
//! ## Features
//!
//! - **Session state machine**: HELO/EHLO, MAIL, RCPT, DATA, RSET, NOOP,
//!   VRFY, QUIT with the standard sequencing replies
//! - **Extensions**: 8BITMIME, SIZE, PIPELINING, SMTPUTF8
//! - **Limits**: command line length, message size and idle timeout
//! - **Transport-agnostic sessions**: anything `AsyncRead + AsyncWrite`
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use inboxium_smtp::{Envelope, Reply, Server, ServerConfig, SessionHandler};
//!
//! struct Print;
//!
//! impl SessionHandler for Print {
//!     async fn on_data(&self, envelope: &Envelope) -> Reply {
//!         println!("mail from {} to {:?}", envelope.mail_from, envelope.rcpt_tos);
//!         Reply::ok()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> inboxium_smtp::Result<()> {
//!     let server = Server::bind(ServerConfig::new("127.0.0.1")).await?;
//!     server.serve(Arc::new(Print)).await
//! }
//! ```
//!
//! ## Session Phases
//!
//! ```text
//! Connected ── HELO/EHLO ──→ Ready ── MAIL ──→ Mail ── RCPT ──→ Recipients
//!                              ↑                                     │
//!                              └──────── DATA complete / RSET ───────┘
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP commands
//! - [`config`]: Server configuration
//! - [`connection`]: Buffered stream and per-client session
//! - [`parser`]: Command and reply parsers
//! - [`types`]: Core SMTP types (addresses, envelope, extensions, replies)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod config;
pub mod connection;
mod error;
mod handler;
pub mod parser;
mod server;
pub mod types;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use connection::{Session, SmtpStream};
pub use error::{Error, Result};
pub use handler::SessionHandler;
pub use server::Server;
pub use types::{Address, Envelope, Extension, Reply, ReplyCode};
