//! Server-side SMTP session state machine.

use super::SmtpStream;
use crate::command::Command;
use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::handler::SessionHandler;
use crate::parser::parse_command;
use crate::types::{Address, Envelope, Extension, Reply, ReplyCode};
use bytes::Bytes;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Read size for DATA; longer lines arrive in several pieces.
const DATA_CHUNK: usize = 8192;

/// Where the client is in the command sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No HELO/EHLO yet.
    Connected,
    /// Greeted, no transaction open.
    Ready,
    /// MAIL accepted, no recipient yet.
    Mail,
    /// At least one recipient accepted.
    Recipients,
}

/// Whether the session keeps reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Result of reading a DATA payload.
#[derive(Debug)]
enum Payload {
    Complete(Vec<u8>),
    TooLarge(usize),
    TimedOut,
    Disconnected,
}

/// One client connection.
#[derive(Debug)]
pub struct Session<S, H> {
    stream: SmtpStream<S>,
    handler: Arc<H>,
    config: Arc<ServerConfig>,
    phase: Phase,
    envelope: Envelope,
}

impl<S, H> Session<S, H>
where
    S: AsyncRead + AsyncWrite + Unpin,
    H: SessionHandler,
{
    /// Creates a session over an accepted transport.
    #[must_use]
    pub fn new(stream: S, handler: Arc<H>, config: Arc<ServerConfig>) -> Self {
        Self {
            stream: SmtpStream::new(stream, config.max_line_length),
            handler,
            config,
            phase: Phase::Connected,
            envelope: Envelope::default(),
        }
    }

    /// Runs the session until the client quits, disconnects or idles out.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails.
    pub async fn run(mut self) -> Result<()> {
        let greeting = format!("{} ESMTP Inboxium", self.config.hostname);
        self.send(&Reply::single(ReplyCode::SERVICE_READY, greeting))
            .await?;

        loop {
            let line = match timeout(self.config.timeout, self.stream.read_line()).await {
                Err(_) => {
                    self.close_idle().await?;
                    return Ok(());
                }
                Ok(Ok(Some(line))) => line,
                Ok(Ok(None)) => {
                    debug!("Client closed connection");
                    return Ok(());
                }
                Ok(Err(err)) if err.is_recoverable() => {
                    warn!(%err, "Rejected command line");
                    self.send(&err.to_reply()).await?;
                    continue;
                }
                Ok(Err(err)) => return Err(err),
            };

            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(err) => {
                    warn!(%err, "Rejected command");
                    self.send(&err.to_reply()).await?;
                    continue;
                }
            };

            debug!(%command, "Received command");
            if self.execute(command).await? == Flow::Close {
                return Ok(());
            }
        }
    }

    async fn execute(&mut self, command: Command) -> Result<Flow> {
        let reply = match command {
            Command::Helo { hostname } => {
                self.greet(&hostname);
                Reply::single(ReplyCode::OK, self.config.hostname.clone())
            }
            Command::Ehlo { hostname } => {
                self.greet(&hostname);
                let mut lines = vec![self.config.hostname.clone()];
                lines.extend(
                    Extension::advertised(self.config.max_message_size)
                        .iter()
                        .map(ToString::to_string),
                );
                Reply::new(ReplyCode::OK, lines)
            }
            Command::MailFrom {
                from,
                size,
                smtputf8,
                ..
            } => self.mail(from, size, smtputf8),
            Command::RcptTo { to } => self.rcpt(&to).await,
            Command::Data => return self.data().await,
            Command::Rset => {
                self.reset_transaction();
                Reply::ok()
            }
            Command::Noop => Reply::ok(),
            Command::Vrfy { .. } => Reply::single(
                ReplyCode::CANNOT_VERIFY,
                "Cannot VRFY user, but will accept message and attempt delivery",
            ),
            Command::Quit => {
                let text = format!("{} Service closing transmission channel", self.config.hostname);
                self.send(&Reply::single(ReplyCode::CLOSING, text)).await?;
                return Ok(Flow::Close);
            }
        };

        self.send(&reply).await?;
        Ok(Flow::Continue)
    }

    fn greet(&mut self, client: &str) {
        debug!(client, "Client greeted");
        self.envelope = Envelope::default();
        self.phase = Phase::Ready;
    }

    fn mail(&mut self, from: Option<Address>, size: Option<usize>, smtputf8: bool) -> Reply {
        match self.phase {
            Phase::Connected => return bad_sequence("Error: send HELO first"),
            Phase::Mail | Phase::Recipients => return bad_sequence("Error: nested MAIL command"),
            Phase::Ready => {}
        }

        if let Some(size) = size.filter(|&size| size > self.config.max_message_size) {
            return Error::MessageTooLarge(size).to_reply();
        }

        self.envelope = Envelope {
            mail_from: from.map(|addr| addr.to_string()).unwrap_or_default(),
            smtputf8,
            ..Envelope::default()
        };
        self.phase = Phase::Mail;
        Reply::ok()
    }

    async fn rcpt(&mut self, to: &Address) -> Reply {
        if !matches!(self.phase, Phase::Mail | Phase::Recipients) {
            return bad_sequence("Error: need MAIL command");
        }

        let reply = self
            .handler
            .on_recipient(&mut self.envelope, to.as_str())
            .await;
        if reply.is_success() {
            self.phase = Phase::Recipients;
        }
        reply
    }

    async fn data(&mut self) -> Result<Flow> {
        match self.phase {
            Phase::Recipients => {}
            Phase::Mail => {
                self.send(&bad_sequence("Error: need RCPT command")).await?;
                return Ok(Flow::Continue);
            }
            Phase::Connected | Phase::Ready => {
                self.send(&bad_sequence("Error: need MAIL command")).await?;
                return Ok(Flow::Continue);
            }
        }

        self.send(&Reply::single(
            ReplyCode::START_DATA,
            "End data with <CR><LF>.<CR><LF>",
        ))
        .await?;

        let reply = match self.read_payload().await? {
            Payload::Complete(content) => {
                debug!(bytes = content.len(), "Received message data");
                self.envelope.content = Bytes::from(content);
                self.handler.on_data(&self.envelope).await
            }
            Payload::TooLarge(received) => {
                warn!(received, limit = self.config.max_message_size, "Message too large");
                Error::MessageTooLarge(received).to_reply()
            }
            Payload::TimedOut => {
                self.close_idle().await?;
                return Ok(Flow::Close);
            }
            Payload::Disconnected => {
                debug!("Client disconnected during DATA");
                return Ok(Flow::Close);
            }
        };

        self.reset_transaction();
        self.send(&reply).await?;
        Ok(Flow::Continue)
    }

    /// Reads DATA lines up to the lone `.`, removing dot-stuffing.
    ///
    /// Once the payload exceeds the size limit the rest is read and dropped.
    async fn read_payload(&mut self) -> Result<Payload> {
        let limit = self.config.max_message_size;
        let mut content = Vec::new();
        let mut chunk = Vec::with_capacity(DATA_CHUNK);
        let mut received = 0usize;
        let mut too_large = false;
        let mut line_start = true;

        loop {
            chunk.clear();
            let read = timeout(
                self.config.timeout,
                self.stream.read_chunk(&mut chunk, DATA_CHUNK),
            )
            .await;
            let Ok(read) = read else {
                return Ok(Payload::TimedOut);
            };
            if read? == 0 {
                return Ok(Payload::Disconnected);
            }

            if line_start && (chunk == b".\r\n" || chunk == b".\n") {
                break;
            }

            let data = match chunk.strip_prefix(b".") {
                Some(unstuffed) if line_start => unstuffed,
                _ => &chunk[..],
            };
            received = received.saturating_add(data.len());

            if !too_large {
                if received > limit {
                    too_large = true;
                    content = Vec::new();
                } else {
                    content.extend_from_slice(data);
                }
            }
            line_start = chunk.ends_with(b"\n");
        }

        if too_large {
            Ok(Payload::TooLarge(received))
        } else {
            Ok(Payload::Complete(content))
        }
    }

    fn reset_transaction(&mut self) {
        self.envelope = Envelope::default();
        if self.phase != Phase::Connected {
            self.phase = Phase::Ready;
        }
    }

    async fn close_idle(&mut self) -> Result<()> {
        warn!(timeout = ?self.config.timeout, "Session idle, closing");
        let text = format!("{} Timeout, closing connection", self.config.hostname);
        self.send(&Reply::single(ReplyCode::SERVICE_UNAVAILABLE, text))
            .await
    }

    async fn send(&mut self, reply: &Reply) -> Result<()> {
        self.stream.write_reply(reply).await
    }
}

fn bad_sequence(text: &str) -> Reply {
    Reply::single(ReplyCode::BAD_SEQUENCE, text)
}
