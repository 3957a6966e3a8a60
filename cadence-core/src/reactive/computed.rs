//! Computed Values
//!
//! A Computed is a cached value derived from signals by a factory function.
//!
//! # How Computed Values Work
//!
//! 1. On first read, the factory runs inside a collection scope; every
//!    signal it reads becomes a dependency.
//!
//! 2. While no dependency changes, reads return the cached result and the
//!    factory is never re-invoked (pure memoization, not time-based caching).
//!
//! 3. When any dependency changes, the dirty flag is raised. The next read
//!    drops the old dependency set, re-evaluates, and rebuilds the set from
//!    scratch, so stale edges never leak across rebuilds.
//!
//! # Fault Isolation
//!
//! A factory that fails does not take the dependency graph down with it:
//! the fault is routed to the logger sink, the previous cached value is
//! retained, and the caller sees that value instead of an error. This
//! lenient behavior is deliberate; availability of the rest of the graph
//! wins over strict error propagation here.

use std::backtrace::Backtrace;
use std::sync::{Arc, RwLock};
use std::fmt::Debug;

use crate::error::BoxError;
use crate::events::{FlagDispatcher, Subscription};
use crate::log::{self, LogPayload};
use crate::reactive::context::{self, ScopeGuard};

/// A cached derived value, recomputed lazily when inputs change.
///
/// Cloning a computed creates a new handle to the same cached state.
pub struct Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Unique identifier for this computed value.
    id: u64,

    /// The factory. Failures are recovered, not propagated.
    factory: Arc<dyn Fn() -> Result<T, BoxError> + Send + Sync>,

    /// Last successfully computed result. `None` until the first
    /// successful evaluation.
    value: Arc<RwLock<Option<T>>>,

    /// One-shot dirty flag; raised by any upstream change, reset before
    /// each recomputation. Downstream computations subscribe to its edge.
    dirty: FlagDispatcher,

    /// Subscriptions to the current dependency set. Replaced wholesale on
    /// every recomputation.
    subscriptions: Arc<RwLock<Vec<Subscription>>>,

    /// Owner-qualified key included in fault reports.
    key: Option<Arc<str>>,
}

impl<T> Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a computed value from an infallible factory.
    ///
    /// The factory does not run until the first read.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::fallible(move || Ok(factory()))
    }

    /// Create a computed value from a factory that may fail.
    pub fn fallible<F>(factory: F) -> Self
    where
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            id: context::next_source_id(),
            factory: Arc::new(factory),
            value: Arc::new(RwLock::new(None)),
            dirty: FlagDispatcher::raised(),
            subscriptions: Arc::new(RwLock::new(Vec::new())),
            key: None,
        }
    }

    /// Attach an owner-qualified key used in fault reports.
    pub fn with_key(mut self, key: impl AsRef<str>) -> Self {
        self.key = Some(Arc::from(key.as_ref()));
        self
    }

    /// Get the computed value's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_raised()
    }

    /// Read the value, recomputing first if a dependency changed.
    ///
    /// Returns `None` only before the first successful evaluation. When the
    /// factory fails, the previous value is returned unchanged.
    ///
    /// If another computation is currently collecting, this computed value
    /// registers itself as one of its dependencies, so invalidation chains
    /// through derived values.
    pub fn get(&self) -> Option<T> {
        // Register with the enclosing computation before evaluating, so the
        // chain is recorded even when our own cache is fresh.
        let dirty = self.dirty.clone();
        context::collect(self.id, move |on_dirty| {
            dirty.subscribe(move || on_dirty())
        });

        if self.dirty.is_raised() {
            self.recompute();
        }

        self.value.read().expect("value lock poisoned").clone()
    }

    /// Recompute inside a fresh collection scope.
    fn recompute(&self) {
        // Release the previous cycle's dependency edges before collecting
        // anew; the set is rebuilt from scratch, never diffed.
        self.subscriptions
            .write()
            .expect("subscriptions lock poisoned")
            .clear();
        self.dirty.reset();

        let dirty = self.dirty.clone();
        let guard = ScopeGuard::begin(Arc::new(move || dirty.raise()));

        match (self.factory)() {
            Ok(new_value) => {
                *self.value.write().expect("value lock poisoned") = Some(new_value);
            }
            Err(fault) => {
                // Keep the last good value; report and move on.
                let mut payload = LogPayload::message(format!(
                    "computed value evaluation failed: {fault}"
                ))
                .with_stack(Backtrace::force_capture().to_string());
                if let Some(key) = &self.key {
                    payload = payload.with_inspect(serde_json::json!({ "key": &**key }));
                }
                log::report(payload);
            }
        }

        let subscriptions = guard.finish();
        *self
            .subscriptions
            .write()
            .expect("subscriptions lock poisoned") = subscriptions;
    }

    /// Release all dependency subscriptions and drop the cached result.
    pub fn dispose(&self) {
        self.subscriptions
            .write()
            .expect("subscriptions lock poisoned")
            .clear();
        *self.value.write().expect("value lock poisoned") = None;
    }

    /// Number of currently held dependency subscriptions.
    pub fn dependency_count(&self) -> usize {
        self.subscriptions
            .read()
            .expect("subscriptions lock poisoned")
            .len()
    }
}

impl<T> Clone for Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            factory: Arc::clone(&self.factory),
            value: Arc::clone(&self.value),
            dirty: self.dirty.clone(),
            subscriptions: Arc::clone(&self.subscriptions),
            key: self.key.clone(),
        }
    }
}

impl<T> Debug for Computed<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.id)
            .field("dirty", &self.is_dirty())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}
