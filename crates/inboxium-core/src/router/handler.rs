//! Handler callbacks and their invocation strategies.
//!
//! A [`Handler`] is either a future-returning task, run on the dispatching
//! task and awaited, or a blocking function, run on tokio's blocking pool
//! and awaited. The strategy is picked by the constructor, never guessed.

use crate::error::BoxError;
use crate::message::InboxMessage;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

type TaskFn = Arc<dyn Fn(Arc<InboxMessage>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;
type BlockingFn = Arc<dyn Fn(&InboxMessage) -> anyhow::Result<()> + Send + Sync>;

#[derive(Clone)]
enum Strategy {
    Task(TaskFn),
    Blocking(BlockingFn),
}

/// Flattened view of a message, with recipients joined by `", "`.
///
/// Passed to handlers built with [`Handler::fields`] or
/// [`Handler::task_fields`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    /// Recipients, comma separated.
    pub to: String,
    /// Sender address.
    pub sender: String,
    /// Decoded subject.
    pub subject: String,
    /// Plain-text body.
    pub text: String,
}

impl From<&InboxMessage> for Fields {
    fn from(message: &InboxMessage) -> Self {
        Self {
            to: message.recipients().join(", "),
            sender: message.sender().to_string(),
            subject: message.subject().to_string(),
            text: message.text().to_string(),
        }
    }
}

/// A side-effecting message callback.
///
/// # Example
///
/// ```ignore
/// use inboxium_core::Handler;
///
/// let log = Handler::task(|message| async move {
///     tracing::info!(subject = message.subject(), "Got mail");
///     Ok(())
/// })
/// .named("log");
///
/// let archive = Handler::blocking(|message| {
///     std::fs::write("/tmp/last.eml", message.raw())?;
///     Ok(())
/// });
/// ```
#[derive(Clone)]
pub struct Handler {
    name: Option<String>,
    strategy: Strategy,
}

impl Handler {
    /// Creates an async handler, awaited on the dispatching task.
    pub fn task<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<InboxMessage>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: None,
            strategy: Strategy::Task(Arc::new(move |message| f(message).boxed())),
        }
    }

    /// Creates a synchronous handler, run on the blocking thread pool.
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn(&InboxMessage) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: None,
            strategy: Strategy::Blocking(Arc::new(f)),
        }
    }

    /// Creates a synchronous handler that takes the flattened fields.
    pub fn fields<F>(f: F) -> Self
    where
        F: Fn(Fields) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::blocking(move |message| f(Fields::from(message)))
    }

    /// Creates an async handler that takes the flattened fields.
    pub fn task_fields<F, Fut>(f: F) -> Self
    where
        F: Fn(Fields) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::task(move |message| f(Fields::from(&*message)))
    }

    /// Names the handler for logs and errors.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the handler name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Checks if the handler runs on the blocking thread pool.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(self.strategy, Strategy::Blocking(_))
    }

    /// Runs the handler to completion.
    ///
    /// Errors and panics are both returned as errors.
    pub(crate) async fn invoke(&self, message: Arc<InboxMessage>) -> Result<(), BoxError> {
        match &self.strategy {
            Strategy::Task(f) => {
                let run = async { f(message).await };
                match AssertUnwindSafe(run).catch_unwind().await {
                    Ok(result) => result.map_err(Into::into),
                    Err(payload) => Err(panic_message(&*payload).into()),
                }
            }
            Strategy::Blocking(f) => {
                let f = Arc::clone(f);
                match tokio::task::spawn_blocking(move || f(&message)).await {
                    Ok(result) => result.map_err(Into::into),
                    Err(err) if err.is_panic() => Err(panic_message(&*err.into_panic()).into()),
                    Err(err) => Err(err.into()),
                }
            }
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategy = match self.strategy {
            Strategy::Task(_) => "task",
            Strategy::Blocking(_) => "blocking",
        };
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("strategy", &strategy)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str));
    match detail {
        Some(detail) => format!("handler panicked: {detail}"),
        None => "handler panicked".to_string(),
    }
}
