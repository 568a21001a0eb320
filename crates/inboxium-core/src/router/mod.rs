//! Predicate-based handler dispatch.
//!
//! A [`Router`] holds an ordered list of [`Route`]s. Dispatching a message
//! walks the list in registration order:
//!
//! 1. Routes whose predicate does not match are skipped
//! 2. A matching route's handler is invoked and awaited
//! 3. If the route is blocking, dispatch stops there
//! 4. If the handler fails, dispatch stops and reports the failure
//!
//! ```ignore
//! use inboxium_core::{Handler, Predicate, Route, Router};
//!
//! let mut router = Router::new();
//!
//! // Sees every message, lets later routes run too
//! router.add(Route::new(Predicate::new(), audit).block(false));
//!
//! // Claims support mail
//! router.add(Route::new(Predicate::new().recipient("support@example.com"), ticket));
//! ```

mod handler;
mod predicate;

pub use handler::{Fields, Handler};
pub use predicate::{MatchMode, Predicate};

use crate::error::Error;
use crate::message::InboxMessage;
use std::sync::Arc;
use tracing::debug;

/// A predicate paired with the handler it guards.
#[derive(Debug, Clone)]
pub struct Route {
    predicate: Predicate,
    handler: Handler,
    block: bool,
}

impl Route {
    /// Creates a blocking route.
    #[must_use]
    pub const fn new(predicate: Predicate, handler: Handler) -> Self {
        Self {
            predicate,
            handler,
            block: true,
        }
    }

    /// Sets whether a match stops dispatch.
    #[must_use]
    pub const fn block(mut self, block: bool) -> Self {
        self.block = block;
        self
    }

    /// Returns the predicate.
    #[must_use]
    pub const fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Returns the handler.
    #[must_use]
    pub const fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Checks if a match stops dispatch.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        self.block
    }
}

/// Result of dispatching one message.
#[derive(Debug)]
pub enum Outcome {
    /// No handler failed.
    Accepted {
        /// Number of handlers invoked.
        invoked: usize,
    },
    /// A handler failed and the remaining routes were skipped.
    Failed(Error),
}

impl Outcome {
    /// Checks if dispatch completed without a failure.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Converts into a `Result` carrying the invocation count.
    ///
    /// # Errors
    ///
    /// Returns the handler failure for [`Outcome::Failed`].
    pub fn into_result(self) -> crate::Result<usize> {
        match self {
            Self::Accepted { invoked } => Ok(invoked),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Ordered, append-only route table.
#[derive(Default, Clone)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route.
    pub fn add(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Appends a handler guarded by `predicate`.
    pub fn register(&mut self, predicate: Predicate, handler: Handler, block: bool) {
        self.add(Route::new(predicate, handler).block(block));
    }

    /// Appends a route (builder pattern).
    #[must_use]
    pub fn with(mut self, route: Route) -> Self {
        self.add(route);
        self
    }

    /// Returns the number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Checks if no route is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Returns the routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Returns every route whose predicate matches, ignoring blocking.
    pub fn matching<'a>(&'a self, message: &'a InboxMessage) -> impl Iterator<Item = &'a Route> {
        self.routes
            .iter()
            .filter(move |route| route.predicate.matches(message))
    }

    /// Dispatches a message to the matching handlers.
    ///
    /// Handlers run one at a time; each finishes before the next route is
    /// evaluated.
    pub async fn dispatch(&self, message: Arc<InboxMessage>) -> Outcome {
        let mut invoked = 0;

        for (index, route) in self.routes.iter().enumerate() {
            if !route.predicate.matches(&message) {
                continue;
            }

            let name = route.handler.name();
            debug!(index, handler = name.unwrap_or("unnamed"), "Invoking handler");
            invoked += 1;

            if let Err(source) = route.handler.invoke(Arc::clone(&message)).await {
                return Outcome::Failed(Error::HandlerFailure {
                    index,
                    name: name.map(str::to_string),
                    source,
                });
            }

            if route.block {
                debug!(
                    index,
                    handler = name.unwrap_or("unnamed"),
                    "Blocking route matched, stopping dispatch"
                );
                break;
            }
        }

        Outcome::Accepted { invoked }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("route_count", &self.routes.len())
            .finish()
    }
}
