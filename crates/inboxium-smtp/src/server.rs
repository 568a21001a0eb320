//! TCP accept loop.

use crate::config::ServerConfig;
use crate::connection::Session;
use crate::error::Result;
use crate::handler::SessionHandler;
use std::future::{self, Future};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Bound SMTP listener.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the configured address and port.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be resolved or bound.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind((config.address.as_str(), config.port)).await?;
        info!(
            address = %listener.local_addr()?,
            hostname = %config.hostname,
            "SMTP server listening"
        );
        Ok(Self {
            listener,
            config: Arc::new(config),
        })
    }

    /// Returns the address actually bound, useful with port 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accepts connections forever.
    ///
    /// # Errors
    ///
    /// Accept failures are logged and skipped rather than returned.
    pub async fn serve<H: SessionHandler>(self, handler: Arc<H>) -> Result<()> {
        self.serve_with_shutdown(handler, future::pending()).await
    }

    /// Accepts connections until `signal` resolves.
    ///
    /// Every connection runs as its own task. Sessions already running when
    /// the signal fires are left to finish on their own.
    ///
    /// # Errors
    ///
    /// Accept failures are logged and skipped rather than returned.
    pub async fn serve_with_shutdown<H, F>(self, handler: Arc<H>, signal: F) -> Result<()>
    where
        H: SessionHandler,
        F: Future<Output = ()>,
    {
        tokio::pin!(signal);

        loop {
            tokio::select! {
                () = &mut signal => {
                    info!("Shutdown requested, no longer accepting connections");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (socket, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(err) => {
                            warn!(%err, "Failed to accept connection");
                            continue;
                        }
                    };

                    info!(%peer, "Accepted connection");
                    let session = Session::new(socket, Arc::clone(&handler), Arc::clone(&self.config));
                    tokio::spawn(async move {
                        match session.run().await {
                            Ok(()) => debug!(%peer, "Session closed"),
                            Err(err) => warn!(%peer, %err, "Session ended with error"),
                        }
                    });
                }
            }
        }
    }
}
