//! Reactive Primitives
//!
//! This module implements the signal/dependency-tracking engine: signals,
//! computed values, compound signals, and the collection machinery that
//! wires them together.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a memoized mutable cell. Reading it while a computed value
//! is evaluating registers a dependency edge automatically; writing it
//! flips the dirty flag of every dependent without recomputing anything.
//!
//! ## Computed values
//!
//! A Computed caches a value derived from signals. It re-evaluates lazily,
//! on the first read after an upstream change, rebuilding its dependency
//! set from scratch each time.
//!
//! ## Compound signals
//!
//! A CompoundSignal aggregates named scalar sub-signals behind one
//! structured value with a shared interpolation contract.
//!
//! # Implementation Notes
//!
//! Dependency discovery uses a thread-local stack of collection scopes.
//! When a signal is read, the innermost open scope (if any) subscribes its
//! dirty handler to the signal's change event. Nested evaluations each
//! collect into their own scope, so chained computed values work without
//! cross-contamination.

mod compound;
mod computed;
pub(crate) mod context;
mod property;
mod signal;

pub use compound::{CompoundSignal, CompoundValue, Vec2};
pub use computed::Computed;
pub use context::{collect, is_collecting, DirtyHandler, ScopeGuard};
pub use property::{Property, PropertyDescriptor, PropertyRegistry};
pub use signal::{Signal, SignalBuilder, SignalMeta, TweenSpec};
