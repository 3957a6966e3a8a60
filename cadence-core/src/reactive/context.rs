//! Dependency Collection
//!
//! Tracks which computation is currently evaluating so that signal reads can
//! register themselves as dependencies of it.
//!
//! # Implementation
//!
//! A thread-local stack of collection scopes. Opening a scope (when a
//! computed value starts evaluating) pushes an entry; signal reads collect
//! into the top entry only, so nested evaluations never cross-contaminate.
//! The scope is closed by a guard, which verifies on drop that it is popping
//! its own entry. A mismatched pop is a programming fault and fails loudly.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexSet;

use crate::events::Subscription;

/// Counter for generating unique scope IDs.
static SCOPE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_scope_id() -> u64 {
    SCOPE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

// Signals and computed values share one ID space: a scope's dedup set
// keys on these, so two distinct sources must never carry the same ID.
static SOURCE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Allocate an ID for a collectable source (signal or computed value).
pub(crate) fn next_source_id() -> u64 {
    SOURCE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Handler invoked when any dependency collected by a scope changes.
pub type DirtyHandler = Arc<dyn Fn() + Send + Sync>;

struct ScopeEntry {
    scope_id: u64,
    on_dirty: DirtyHandler,
    /// Source IDs already collected in this scope, in read order.
    seen: IndexSet<u64>,
    /// Live subscriptions to the collected sources.
    subscriptions: Vec<Subscription>,
}

thread_local! {
    static COLLECTION_STACK: RefCell<Vec<ScopeEntry>> = const { RefCell::new(Vec::new()) };
}

/// Guard for an open collection scope.
///
/// Must be finished (or dropped) exactly once, after which the scope entry it
/// pushed is removed from the stack. Dropping out of order panics.
pub struct ScopeGuard {
    scope_id: u64,
    finished: bool,
}

impl ScopeGuard {
    /// Open a new collection scope.
    ///
    /// While the scope is the top of the stack, every signal read registers a
    /// subscription that invokes `on_dirty` on future mutation.
    pub fn begin(on_dirty: DirtyHandler) -> Self {
        let scope_id = next_scope_id();
        COLLECTION_STACK.with(|stack| {
            stack.borrow_mut().push(ScopeEntry {
                scope_id,
                on_dirty,
                seen: IndexSet::new(),
                subscriptions: Vec::new(),
            });
        });
        Self {
            scope_id,
            finished: false,
        }
    }

    /// Close the scope and take the subscriptions it collected.
    ///
    /// The caller (a computed value) owns them until the next recomputation;
    /// dropping them releases the dependency edges.
    pub fn finish(mut self) -> Vec<Subscription> {
        self.finished = true;
        let entry = Self::pop_checked(self.scope_id);
        entry.subscriptions
    }

    fn pop_checked(scope_id: u64) -> ScopeEntry {
        COLLECTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let entry = stack
                .pop()
                .unwrap_or_else(|| panic!("collection scope {scope_id} already closed"));
            if entry.scope_id != scope_id {
                // Push the entry back so the rightful guard can still find
                // it, then fail: an out-of-order close corrupts collection.
                let found = entry.scope_id;
                stack.push(entry);
                panic!(
                    "collection scope closed out of order: expected {scope_id}, top is {found}"
                );
            }
            entry
        })
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if std::thread::panicking() {
            // Unwinding through an open scope: best-effort pop without the
            // identity check to avoid a double panic.
            COLLECTION_STACK.with(|stack| {
                let mut stack = stack.borrow_mut();
                if stack.last().map(|e| e.scope_id) == Some(self.scope_id) {
                    stack.pop();
                }
            });
            return;
        }
        Self::pop_checked(self.scope_id);
    }
}

/// Whether any collection scope is currently open on this thread.
pub fn is_collecting() -> bool {
    COLLECTION_STACK.with(|stack| !stack.borrow().is_empty())
}

/// Register a dependency of the innermost open scope.
///
/// `source_id` deduplicates repeated reads of the same source within one
/// scope. On first sight, `subscribe` is invoked with the scope's dirty
/// handler and the returned subscription is retained by the scope. Outside
/// of any scope this is a no-op.
pub fn collect<F>(source_id: u64, subscribe: F)
where
    F: FnOnce(DirtyHandler) -> Subscription,
{
    let handler = COLLECTION_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let entry = match stack.last_mut() {
            Some(entry) => entry,
            None => return None,
        };
        if !entry.seen.insert(source_id) {
            return None;
        }
        Some((entry.scope_id, Arc::clone(&entry.on_dirty)))
    });

    // Subscribe outside the stack borrow: the dispatcher side may call back
    // into collection (a signal read inside a subscribe hook).
    if let Some((scope_id, handler)) = handler {
        let subscription = subscribe(handler);
        COLLECTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(entry) = stack
                .iter_mut()
                .rev()
                .find(|entry| entry.scope_id == scope_id)
            {
                entry.subscriptions.push(subscription);
            }
        });
    }
}
