//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive: a memoized mutable cell
//! with a getter/setter pair, an optional parser applied to raw input, and
//! an interpolation function used when the cell is tweened.
//!
//! # How Signals Work
//!
//! 1. When a signal is read while a computed value is evaluating, the signal
//!    registers itself as a dependency of that computation.
//!
//! 2. When a signal's value changes, its change event dispatches, flipping
//!    the dirty flag of every dependent computation. Nothing recomputes
//!    eagerly; dependents re-evaluate on their next read.
//!
//! 3. Reading outside of any evaluation returns the last committed value
//!    with no side effects.
//!
//! # Thread Safety
//!
//! The value is protected by a RwLock and handles can be cloned freely,
//! matching the sharing model used across the crate. Mutation is only ever
//! performed by the cooperative step currently holding control.

use std::sync::{Arc, RwLock};
use std::fmt::Debug;

use crate::events::{EventDispatcher, Subscription};
use crate::reactive::context;
use crate::tween::{linear, lerp_interpolation, EasingFn, Interpolation, Lerp};

/// Metadata describing a signal to inspectors and cloning machinery.
#[derive(Debug, Clone, Default)]
pub struct SignalMeta {
    /// Owner-qualified property key, e.g. `"circle.opacity"`.
    pub key: Option<String>,
    /// Whether the value participates in node cloning.
    pub cloneable: bool,
    /// Whether the value is surfaced to inspectors.
    pub inspectable: bool,
}

/// A reactive memoized cell holding a value of type `T`.
///
/// Cloning a signal creates a new handle to the same cell.
///
/// # Example
///
/// ```rust,ignore
/// let opacity = Signal::new(1.0);
///
/// // Read the value
/// let value = opacity.get();
///
/// // Write a new value (notifies dependents)
/// opacity.set(0.5);
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Unique identifier for this signal.
    id: u64,

    /// The current value.
    value: Arc<RwLock<T>>,

    /// The configured default, restored by `reset`.
    default: Arc<T>,

    /// Optional normalization applied to every raw write.
    parser: Option<Arc<dyn Fn(T) -> T + Send + Sync>>,

    /// Optional explicit interpolation function for tweens.
    interpolation: Option<Interpolation<T>>,

    /// Dispatches the committed value on every write.
    changed: EventDispatcher<T>,

    /// Inspector/cloning metadata.
    meta: Arc<SignalMeta>,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a signal with the given default value and no parser.
    pub fn new(default: T) -> Self {
        SignalBuilder::new(default).build()
    }

    /// Start building a signal with a parser, interpolation or metadata.
    pub fn builder(default: T) -> SignalBuilder<T> {
        SignalBuilder::new(default)
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Metadata describing this signal.
    pub fn meta(&self) -> &SignalMeta {
        &self.meta
    }

    /// Read the current value.
    ///
    /// If a computed value is currently evaluating, this registers the
    /// signal as one of its dependencies.
    pub fn get(&self) -> T {
        let changed = self.changed.clone();
        context::collect(self.id, move |on_dirty| {
            changed.subscribe(move |_| on_dirty())
        });

        self.value.read().expect("value lock poisoned").clone()
    }

    /// Read the current value without registering a dependency.
    pub fn get_untracked(&self) -> T {
        self.value.read().expect("value lock poisoned").clone()
    }

    /// Write a new value.
    ///
    /// Raw input is converted via `Into` and then normalized by the parser
    /// when one is configured. Dependents are notified; none of them
    /// recompute until they are next read.
    pub fn set(&self, value: impl Into<T>) {
        let mut value = value.into();
        if let Some(parser) = &self.parser {
            value = parser(value);
        }
        {
            let mut guard = self.value.write().expect("value lock poisoned");
            *guard = value.clone();
        }
        self.changed.dispatch(&value);
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = {
            let guard = self.value.read().expect("value lock poisoned");
            f(&guard)
        };
        self.set(new_value);
    }

    /// Restore the configured default.
    pub fn reset(&self) {
        self.set((*self.default).clone());
    }

    /// Observe committed writes.
    #[must_use = "dropping the subscription immediately removes the handler"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.changed.subscribe(handler)
    }

    /// Number of registered change handlers (dependents and observers).
    pub fn subscriber_count(&self) -> usize {
        self.changed.subscriber_count()
    }
}

impl<T> Signal<T>
where
    T: Lerp + Send + Sync + 'static,
{
    /// The interpolation used when this signal is tweened: the explicit
    /// function when configured, otherwise the structural [`Lerp`] fallback.
    pub fn interpolation(&self) -> Interpolation<T> {
        match &self.interpolation {
            Some(f) => Arc::clone(f),
            None => lerp_interpolation::<T>(),
        }
    }

    /// Describe a tween of this signal toward `to` over `duration` seconds.
    ///
    /// The returned spec is a lazy description of intermediate writes at
    /// increasing progress fractions; driving it forward is the scheduler's
    /// job, typically via `task::tween`.
    pub fn tween(&self, to: impl Into<T>, duration: f64) -> TweenSpec<T> {
        TweenSpec {
            signal: self.clone(),
            to: to.into(),
            duration,
            easing: linear,
        }
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
            default: Arc::clone(&self.default),
            parser: self.parser.clone(),
            interpolation: self.interpolation.clone(),
            changed: self.changed.clone(),
            meta: Arc::clone(&self.meta),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Builder for signals carrying a parser, interpolation or metadata.
pub struct SignalBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    default: T,
    parser: Option<Arc<dyn Fn(T) -> T + Send + Sync>>,
    interpolation: Option<Interpolation<T>>,
    meta: SignalMeta,
}

impl<T> SignalBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new(default: T) -> Self {
        Self {
            default,
            parser: None,
            interpolation: None,
            meta: SignalMeta {
                key: None,
                cloneable: true,
                inspectable: true,
            },
        }
    }

    /// Normalize every raw write through `parser`.
    pub fn parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Use an explicit interpolation function for tweens.
    pub fn interpolation<F>(mut self, f: F) -> Self
    where
        F: Fn(&T, &T, f64) -> T + Send + Sync + 'static,
    {
        self.interpolation = Some(Arc::new(f));
        self
    }

    /// Owner-qualified property key for log payloads and inspectors.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.meta.key = Some(key.into());
        self
    }

    pub fn cloneable(mut self, cloneable: bool) -> Self {
        self.meta.cloneable = cloneable;
        self
    }

    pub fn inspectable(mut self, inspectable: bool) -> Self {
        self.meta.inspectable = inspectable;
        self
    }

    pub fn build(self) -> Signal<T> {
        let default = match &self.parser {
            Some(parser) => parser(self.default.clone()),
            None => self.default.clone(),
        };
        Signal {
            id: context::next_source_id(),
            value: Arc::new(RwLock::new(default.clone())),
            default: Arc::new(default),
            parser: self.parser,
            interpolation: self.interpolation,
            changed: EventDispatcher::new(),
            meta: Arc::new(self.meta),
        }
    }
}

/// A lazy description of a tween: the target value, the duration, and the
/// easing applied to progress. Consumed by the scheduler.
#[derive(Clone)]
pub struct TweenSpec<T>
where
    T: Lerp + Send + Sync + 'static,
{
    signal: Signal<T>,
    to: T,
    duration: f64,
    easing: EasingFn,
}

impl<T> TweenSpec<T>
where
    T: Lerp + Send + Sync + 'static,
{
    /// Apply an easing function to the tween's progress.
    pub fn ease(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn signal(&self) -> &Signal<T> {
        &self.signal
    }

    pub fn target(&self) -> &T {
        &self.to
    }

    /// Write the interpolated value at the given progress fraction.
    ///
    /// Progress is clamped to `[0, 1]` and eased before interpolation; the
    /// write goes through the signal's normal set path, so parsers and
    /// change notifications apply.
    pub fn write_at(&self, from: &T, progress: f64) {
        let eased = (self.easing)(progress.clamp(0.0, 1.0));
        let value = (self.signal.interpolation())(from, &self.to, eased);
        self.signal.set(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::context::ScopeGuard;

    #[test]
    fn signal_get_and_set() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        signal.set(42);
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn signal_update() {
        let signal = Signal::new(10);
        signal.update(|v| v + 5);
        assert_eq!(signal.get(), 15);
    }

    #[test]
    fn parser_normalizes_raw_input() {
        let signal = Signal::builder(0.5_f64)
            .parser(|v| v.clamp(0.0, 1.0))
            .build();

        signal.set(2.5);
        assert_eq!(signal.get(), 1.0);

        signal.set(-1.0);
        assert_eq!(signal.get(), 0.0);
    }

    #[test]
    fn without_parser_raw_input_is_stored_as_is() {
        let signal = Signal::new(0.0_f64);
        signal.set(123.456);
        assert_eq!(signal.get(), 123.456);
    }

    #[test]
    fn reset_restores_default() {
        let signal = Signal::new(7);
        signal.set(99);
        assert_eq!(signal.get(), 99);

        signal.reset();
        assert_eq!(signal.get(), 7);
    }

    #[test]
    fn set_notifies_subscribers_in_order() {
        let signal = Signal::new(0);
        let seen = Arc::new(RwLock::new(Vec::new()));

        let seen_a = seen.clone();
        let _a = signal.subscribe(move |v| seen_a.write().unwrap().push(("a", *v)));
        let seen_b = seen.clone();
        let _b = signal.subscribe(move |v| seen_b.write().unwrap().push(("b", *v)));

        signal.set(3);
        assert_eq!(*seen.read().unwrap(), vec![("a", 3), ("b", 3)]);
    }

    #[test]
    fn read_inside_collection_scope_registers_dependency() {
        let signal = Signal::new(1);

        let guard = ScopeGuard::begin(Arc::new(|| {}));
        let _ = signal.get();
        let subs = guard.finish();

        assert_eq!(subs.len(), 1);
        assert_eq!(signal.subscriber_count(), 1);

        drop(subs);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn read_outside_collection_scope_has_no_side_effects() {
        let signal = Signal::new(1);
        let _ = signal.get();
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn signal_clone_shares_state() {
        let signal1 = Signal::new(0);
        let signal2 = signal1.clone();

        signal1.set(42);
        assert_eq!(signal2.get(), 42);

        signal2.set(100);
        assert_eq!(signal1.get(), 100);
    }

    #[test]
    fn signal_ids_are_unique() {
        let s1 = Signal::new(0);
        let s2 = Signal::new(0);
        let s3 = Signal::new(0);

        assert_ne!(s1.id(), s2.id());
        assert_ne!(s2.id(), s3.id());
        assert_ne!(s1.id(), s3.id());
    }

    #[test]
    fn tween_spec_writes_through_the_set_path() {
        let signal = Signal::builder(0.0_f64)
            .parser(|v| v.clamp(0.0, 10.0))
            .build();
        let spec = signal.tween(20.0, 1.0);

        spec.write_at(&0.0, 0.5);
        // 0..20 at p=0.5 is 10 before parsing; parser clamps to 10.
        assert_eq!(signal.get(), 10.0);

        spec.write_at(&0.0, 0.25);
        assert_eq!(signal.get(), 5.0);
    }

    #[test]
    fn tween_spec_honors_explicit_interpolation() {
        // Step interpolation: jumps straight to the target.
        let signal = Signal::builder(0.0_f64)
            .interpolation(|from, to, p| if p >= 1.0 { *to } else { *from })
            .build();
        let spec = signal.tween(5.0, 1.0);

        spec.write_at(&0.0, 0.9);
        assert_eq!(signal.get(), 0.0);

        spec.write_at(&0.0, 1.0);
        assert_eq!(signal.get(), 5.0);
    }

    #[test]
    fn builder_applies_parser_to_default() {
        let signal = Signal::builder(5.0_f64)
            .parser(|v| v.clamp(0.0, 1.0))
            .build();
        assert_eq!(signal.get(), 1.0);
    }
}
