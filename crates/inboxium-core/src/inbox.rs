//! The inbox: SMTP callbacks wired to normalization and dispatch.

use crate::error::Result;
use crate::normalize::normalize;
use crate::router::{Handler, Predicate, Route, Router};
use inboxium_smtp::{Envelope, Reply, ReplyCode, Server, ServerConfig, SessionHandler};
use std::future::{self, Future};
use std::sync::Arc;
use tracing::{debug, error, info};

/// An SMTP inbox that routes every received message to registered handlers.
///
/// Handlers are registered through `&mut self` before serving; serving
/// consumes the inbox, so the route table is read-only once connections
/// arrive.
///
/// # Example
///
/// ```ignore
/// use inboxium_core::{Handler, Inbox, Predicate};
/// use inboxium_smtp::ServerConfig;
///
/// let mut inbox = Inbox::new(ServerConfig::builder("127.0.0.1").port(2525).build());
/// inbox.register(
///     Predicate::new().recipient("support@example.com"),
///     Handler::task(|message| async move {
///         println!("ticket: {}", message.subject());
///         Ok(())
///     }),
///     true,
/// );
/// inbox.serve().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Inbox {
    router: Router,
    config: ServerConfig,
}

impl Inbox {
    /// Creates an inbox with no handlers.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            router: Router::new(),
            config,
        }
    }

    /// Creates an inbox listening on `address:port` with default limits.
    #[must_use]
    pub fn bind_to(address: impl Into<String>, port: u16) -> Self {
        Self::new(ServerConfig::builder(address).port(port).build())
    }

    /// Registers a handler guarded by `predicate`.
    ///
    /// When `block` is true a match stops dispatch after this handler.
    pub fn register(&mut self, predicate: Predicate, handler: Handler, block: bool) -> &mut Self {
        self.router.register(predicate, handler, block);
        self
    }

    /// Registers a prepared route.
    pub fn route(&mut self, route: Route) -> &mut Self {
        self.router.add(route);
        self
    }

    /// Returns the route table.
    #[must_use]
    pub const fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the listener configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Normalizes an envelope and dispatches it.
    ///
    /// Returns the number of handlers invoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is malformed or a handler fails.
    pub async fn deliver(&self, envelope: &Envelope) -> Result<usize> {
        let message = Arc::new(normalize(envelope)?);
        debug!(
            sender = message.sender(),
            recipients = message.recipients().len(),
            subject = message.subject(),
            "Normalized message"
        );
        self.router.dispatch(message).await.into_result()
    }

    /// Binds the configured address and serves forever.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(future::pending()).await
    }

    /// Binds the configured address and serves until `signal` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let server = Server::bind(self.config.clone()).await?;
        info!(routes = self.router.len(), "Inbox ready");
        server.serve_with_shutdown(Arc::new(self), signal).await?;
        Ok(())
    }
}

impl SessionHandler for Inbox {
    async fn on_recipient(&self, envelope: &mut Envelope, address: &str) -> Reply {
        debug!(recipient = address, "Recipient accepted");
        envelope.rcpt_tos.push(address.to_string());
        Reply::ok()
    }

    async fn on_data(&self, envelope: &Envelope) -> Reply {
        match self.deliver(envelope).await {
            Ok(invoked) => {
                info!(
                    sender = %envelope.mail_from,
                    recipients = envelope.rcpt_tos.len(),
                    invoked,
                    "Message accepted"
                );
                Reply::single(ReplyCode::OK, "Message accepted for delivery")
            }
            Err(err) => {
                let err = anyhow::Error::new(err);
                error!(
                    sender = %envelope.mail_from,
                    error = %format!("{err:#}"),
                    "Message delivery failed"
                );
                Reply::single(ReplyCode::INTERNAL_ERROR, "Internal server error")
            }
        }
    }
}
