//! Cadence Core
//!
//! This crate provides the core runtime for the Cadence animation engine.
//! It implements:
//!
//! - Reactive primitives (signals, computed values, compound signals)
//!   with automatic dependency tracking
//! - A cooperative, generator-style task scheduler addressed by a virtual
//!   clock, for deterministic, seekable, frame-accurate playback
//! - Interpolation and easing for tweened signal values
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `events`: publish/subscribe primitives everything else builds on
//! - `reactive`: signals, computed values, and dependency collection
//! - `tween`: interpolation and easing
//! - `playback`: virtual time, cooperative threads, and the scene driver
//! - `sync`: the single async mutual-exclusion slot
//! - `log`: the pluggable sink for recovered faults
//!
//! # Example
//!
//! ```rust,ignore
//! use cadence_core::playback::{task, FrameRate, Scene, TaskSeq};
//! use cadence_core::reactive::{Computed, Signal};
//!
//! let opacity = Signal::new(0.0);
//! let visible = {
//!     let opacity = opacity.clone();
//!     Computed::new(move || opacity.get() > 0.5)
//! };
//!
//! let mut scene = Scene::new(FrameRate::new(30.0));
//! let fade_in = opacity.tween(1.0, 0.5);
//! scene.set_root(move || task::tween(fade_in.clone()));
//! ```
//!
//! Data flows strictly one way per frame: time advances, due threads
//! resume and write signals, dependents go dirty, and the render pass
//! reads the settled values.

pub mod error;
pub mod events;
pub mod log;
pub mod playback;
pub mod reactive;
pub mod sync;
pub mod tween;

pub use error::{BoxError, ContextError};
pub use events::{EventDispatcher, FlagDispatcher, Subscription};
pub use playback::{FrameRate, Scene, TaskCtx, TaskFn};
pub use reactive::{Computed, CompoundSignal, Signal, Vec2};
