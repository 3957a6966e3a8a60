//! Event Dispatcher
//!
//! An `EventDispatcher<T>` keeps an ordered list of handlers and invokes them
//! in subscription order on every dispatch. Subscribing returns a
//! [`Subscription`] token; dropping the token removes the handler.
//!
//! Dispatch clones the handler list before invoking, so handlers may
//! subscribe or unsubscribe (including themselves) without deadlocking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use smallvec::SmallVec;

/// Counter for generating unique handler IDs.
static HANDLER_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_handler_id() -> u64 {
    HANDLER_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

struct HandlerEntry<T> {
    id: u64,
    callback: Arc<dyn Fn(&T) + Send + Sync>,
}

impl<T> Clone for HandlerEntry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

type HandlerList<T> = RwLock<SmallVec<[HandlerEntry<T>; 4]>>;

/// An ordered publish/subscribe list.
///
/// Cloning a dispatcher creates a new handle to the same subscriber list.
pub struct EventDispatcher<T> {
    handlers: Arc<HandlerList<T>>,
}

impl<T> EventDispatcher<T>
where
    T: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(SmallVec::new())),
        }
    }

    /// Register a handler. Handlers run in subscription order.
    ///
    /// The handler stays registered until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    #[must_use = "dropping the subscription immediately removes the handler"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = next_handler_id();
        self.handlers
            .write()
            .expect("handlers lock poisoned")
            .push(HandlerEntry {
                id,
                callback: Arc::new(handler),
            });

        let weak = Arc::downgrade(&self.handlers);
        Subscription::new(move || {
            if let Some(handlers) = weak.upgrade() {
                handlers
                    .write()
                    .expect("handlers lock poisoned")
                    .retain(|entry| entry.id != id);
            }
        })
    }

    /// Invoke every handler with the given value, in subscription order.
    pub fn dispatch(&self, value: &T) {
        // Snapshot under the read lock, invoke outside it.
        let snapshot: SmallVec<[HandlerEntry<T>; 4]> = self
            .handlers
            .read()
            .expect("handlers lock poisoned")
            .clone();

        for entry in snapshot.iter() {
            (entry.callback)(value);
        }
    }

    /// Number of currently registered handlers.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().expect("handlers lock poisoned").len()
    }
}

impl<T> Clone for EventDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
        }
    }
}

impl<T> Default for EventDispatcher<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for EventDispatcher<T>
where
    T: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// RAII unsubscribe token.
///
/// Dropping the token removes the associated handler from its dispatcher.
/// The token is type-erased so heterogeneous subscriptions can be stored in
/// one collection (a computed value's dependency set).
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove the handler now instead of waiting for drop.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
