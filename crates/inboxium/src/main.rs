//! `inboxium` - Run an SMTP inbox from the command line
//!
//! Binds the given address and port and logs every message it receives.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use inboxium_core::{Handler, Inbox, InboxMessage, Predicate};
use inboxium_smtp::ServerConfig;
use inboxium_smtp::config::{DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_TIMEOUT};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Run an SMTP inbox.
#[derive(Parser)]
#[command(name = "inboxium")]
#[command(about = "Run an Inbox server.", long_about = None)]
#[command(version)]
struct Cli {
    /// Address to bind to
    addr: String,

    /// Port to bind to
    port: u16,

    /// Hostname used in the greeting and HELO replies
    #[arg(long, default_value = "localhost")]
    hostname: String,

    /// Largest accepted message, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_MESSAGE_SIZE)]
    max_message_size: usize,

    /// Idle timeout, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Print each received message to stdout as a JSON line
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        ServerConfig::builder(&self.addr)
            .hostname(&self.hostname)
            .port(self.port)
            .max_message_size(self.max_message_size)
            .timeout(Duration::from_secs(self.timeout))
            .build()
    }
}

fn log_message(message: &InboxMessage) {
    info!(
        sender = message.sender(),
        recipients = %message.recipients().join(", "),
        subject = message.subject(),
        bytes = message.raw().len(),
        "Received message"
    );
}

fn print_json(message: &InboxMessage) -> anyhow::Result<()> {
    let line = serde_json::to_string(message).context("Failed to encode message")?;
    println!("{line}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inboxium=info,inboxium_core=info,inboxium_smtp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    info!("Starting Inboxium at {}:{}", cli.addr, cli.port);

    let json = cli.json;
    let mut inbox = Inbox::new(cli.server_config());
    inbox.register(
        Predicate::new(),
        Handler::blocking(move |message| {
            log_message(message);
            if json {
                print_json(message)?;
            }
            Ok(())
        })
        .named("log"),
        false,
    );

    inbox
        .serve_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Cleaning up"),
                Err(err) => {
                    warn!(%err, "Unable to listen for Ctrl-C, serving until killed");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
        .context("SMTP server failed")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_address_and_port() {
        let cli = Cli::try_parse_from(["inboxium", "0.0.0.0", "2525"]).unwrap();
        let config = cli.server_config();
        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.port, 2525);
        assert_eq!(config.hostname, "localhost");
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(!cli.json);
    }

    #[test]
    fn test_options() {
        let cli = Cli::try_parse_from([
            "inboxium",
            "127.0.0.1",
            "8025",
            "--hostname",
            "mx.example.com",
            "--max-message-size",
            "1024",
            "--timeout",
            "30",
            "--json",
        ])
        .unwrap();
        let config = cli.server_config();
        assert_eq!(config.hostname, "mx.example.com");
        assert_eq!(config.max_message_size, 1024);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(cli.json);
    }

    #[test]
    fn test_port_is_required() {
        assert!(Cli::try_parse_from(["inboxium", "127.0.0.1"]).is_err());
        assert!(Cli::try_parse_from(["inboxium", "127.0.0.1", "smtp"]).is_err());
    }
}
