//! Exclusive Slot
//!
//! A single-slot mutual-exclusion primitive for serializing one in-flight
//! external asynchronous operation at a time (e.g. one resource fetch).
//! Acquiring suspends the calling async flow, never a cooperative thread;
//! this is the only true asynchronous wait in the engine.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes one external async operation at a time.
///
/// Cloning shares the slot.
#[derive(Clone, Default)]
pub struct ExclusiveSlot {
    inner: Arc<Mutex<()>>,
}

impl ExclusiveSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the slot is free, then hold it until the guard drops.
    pub async fn acquire(&self) -> SlotGuard {
        SlotGuard {
            _guard: Arc::clone(&self.inner).lock_owned().await,
        }
    }

    /// Take the slot only if it is free right now.
    pub fn try_acquire(&self) -> Option<SlotGuard> {
        Arc::clone(&self.inner)
            .try_lock_owned()
            .ok()
            .map(|guard| SlotGuard { _guard: guard })
    }
}

impl std::fmt::Debug for ExclusiveSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExclusiveSlot").finish()
    }
}

/// Held while the slot is occupied; dropping releases it.
pub struct SlotGuard {
    _guard: OwnedMutexGuard<()>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn acquire_serializes_holders() {
        let slot = ExclusiveSlot::new();
        let concurrent = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let slot = slot.clone();
            let concurrent = concurrent.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _guard = slot.acquire().await;
                let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::task::yield_now().await;
                concurrent.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn try_acquire_fails_while_held() {
        let slot = ExclusiveSlot::new();

        let guard = slot.try_acquire().expect("slot should be free");
        assert!(slot.try_acquire().is_none());

        drop(guard);
        assert!(slot.try_acquire().is_some());
    }
}
