//! Event Primitives
//!
//! This module implements the publish/subscribe primitives everything else
//! builds on:
//!
//! - [`EventDispatcher`]: an ordered subscriber list with RAII unsubscribe
//!   tokens. Signals dispatch their committed values through one of these.
//! - [`FlagDispatcher`]: a boolean flag with edge-triggered notification.
//!   Raising the flag notifies subscribers exactly once; resetting is silent;
//!   raising again after a reset notifies again. Computed values use this as
//!   their dirty flag.
//! - [`Subscription`]: dropping it removes the handler from its dispatcher.

mod dispatcher;
mod flag;

pub use dispatcher::{EventDispatcher, Subscription};
pub use flag::FlagDispatcher;
