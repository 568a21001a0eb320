#![allow(clippy::uninlined_format_args, clippy::doc_markdown)]
//! Example: a small support desk inbox
//!
//! Every message is logged, mail to support@ opens a ticket, and anything
//! else gets a catch-all handler.
//!
//! ## Running
//!
//! ```bash
//! cargo run --package inboxium-core --example support_desk
//! ```
//!
//! Then, from another terminal:
//!
//! ```bash
//! swaks --server 127.0.0.1:2525 --to support@example.com --header "Subject: printer on fire"
//! ```

use inboxium_core::{Handler, Inbox, Predicate, Route};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inboxium_core=debug,inboxium_smtp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let tickets = Arc::new(AtomicU64::new(1));
    let mut inbox = Inbox::bind_to("127.0.0.1", 2525);

    inbox
        .route(
            Route::new(
                Predicate::new(),
                Handler::fields(|fields| {
                    println!("[audit] {} -> {}: {}", fields.sender, fields.to, fields.subject);
                    Ok(())
                }),
            )
            .block(false),
        )
        .register(
            Predicate::new().recipient("support@example.com"),
            Handler::task(move |message| {
                let id = tickets.fetch_add(1, Ordering::Relaxed);
                async move {
                    println!("[ticket #{}] {}", id, message.subject());
                    println!("{}", message.text());
                    Ok(())
                }
            })
            .named("tickets"),
            true,
        )
        .register(
            Predicate::new(),
            Handler::blocking(|message| {
                println!("[unrouted] {} bytes from {}", message.raw().len(), message.sender());
                Ok(())
            })
            .named("catch-all"),
            true,
        );

    println!("Listening on 127.0.0.1:2525, Ctrl-C to stop");
    inbox
        .serve_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
