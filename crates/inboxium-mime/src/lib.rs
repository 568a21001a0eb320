//! # inboxium-mime
//!
//! Lenient MIME message parsing and decoding for inbound email.
//!
//! ## Features
//!
//! - **Message parsing**: Parse RFC 5322 messages into a tree of MIME parts
//! - **Transfer decoding**: Base64 and Quoted-Printable bodies
//! - **Header decoding**: RFC 2047 encoded-words with charset conversion
//! - **Charsets**: every WHATWG-registered label, with replacement of anything
//!   undecodable
//!
//! Decoding never fails, and broken multipart structure degrades to a
//! single-part body. Only multipart nesting beyond a fixed depth is rejected.
//!
//! ## Quick Start
//!
//! ```ignore
//! use inboxium_mime::Message;
//!
//! let raw = b"From: sender@example.com\r\n\
//!             Subject: =?utf-8?q?Caf=C3=A9?=\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = Message::parse(raw)?;
//! assert_eq!(message.subject().as_deref(), Some("Café"));
//!
//! for part in message.walk() {
//!     if part.content_type().essence() == "text/plain" {
//!         println!("{}", part.body_text());
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod charset;
pub mod encoding;

pub use charset::Charset;
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Body, Message, Part, TransferEncoding, Walk};
