//! Flag Dispatcher
//!
//! A boolean flag with edge-triggered notification, used as the dirty flag
//! of computed values. Raising the flag while it is down notifies every
//! subscriber once; raising it again while already up is silent, as is
//! resetting. A raise after a reset notifies again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{EventDispatcher, Subscription};

/// Edge-triggered boolean flag.
///
/// Cloning shares the flag state and subscriber list.
#[derive(Clone)]
pub struct FlagDispatcher {
    raised: Arc<AtomicBool>,
    edge: EventDispatcher<()>,
}

impl FlagDispatcher {
    pub fn new() -> Self {
        Self {
            raised: Arc::new(AtomicBool::new(false)),
            edge: EventDispatcher::new(),
        }
    }

    /// Create a flag that starts raised without notifying anyone.
    pub fn raised() -> Self {
        Self {
            raised: Arc::new(AtomicBool::new(true)),
            edge: EventDispatcher::new(),
        }
    }

    /// Raise the flag. Notifies subscribers only on the false -> true edge.
    pub fn raise(&self) {
        if !self.raised.swap(true, Ordering::SeqCst) {
            self.edge.dispatch(&());
        }
    }

    /// Lower the flag silently.
    pub fn reset(&self) {
        self.raised.store(false, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Subscribe to the raise edge.
    #[must_use = "dropping the subscription immediately removes the handler"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.edge.subscribe(move |()| handler())
    }
}

impl Default for FlagDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FlagDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagDispatcher")
            .field("raised", &self.is_raised())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn raise_notifies_once_per_edge() {
        let flag = FlagDispatcher::new();
        let notified = Arc::new(AtomicI32::new(0));
        let notified_clone = notified.clone();

        let _sub = flag.subscribe(move || {
            notified_clone.fetch_add(1, Ordering::SeqCst);
        });

        flag.raise();
        assert!(flag.is_raised());
        assert_eq!(notified.load(Ordering::SeqCst), 1);

        // Already raised: no second notification.
        flag.raise();
        assert_eq!(notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reset_is_silent_and_rearms_the_edge() {
        let flag = FlagDispatcher::new();
        let notified = Arc::new(AtomicI32::new(0));
        let notified_clone = notified.clone();

        let _sub = flag.subscribe(move || {
            notified_clone.fetch_add(1, Ordering::SeqCst);
        });

        flag.raise();
        flag.reset();
        assert!(!flag.is_raised());
        assert_eq!(notified.load(Ordering::SeqCst), 1);

        flag.raise();
        assert_eq!(notified.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn starts_raised_without_notification() {
        let flag = FlagDispatcher::raised();
        assert!(flag.is_raised());
    }

    #[test]
    fn clone_shares_state() {
        let flag1 = FlagDispatcher::new();
        let flag2 = flag1.clone();

        flag1.raise();
        assert!(flag2.is_raised());

        flag2.reset();
        assert!(!flag1.is_raised());
    }
}
