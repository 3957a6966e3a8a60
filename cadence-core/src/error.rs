//! Crate-wide error types.
//!
//! The engine distinguishes two failure classes:
//!
//! - Structural invariant violations (context-stack misuse) are programming
//!   faults and panic immediately with a descriptive message.
//! - Recoverable conditions (reading an ambient context outside any running
//!   evaluation) are ordinary `Result` values.

use thiserror::Error;

/// Boxed error type used by fallible computed-value factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised when resolving ambient context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// No context of the named kind is current. This means the call happened
    /// outside of any running evaluation, not that the context is still
    /// being prepared.
    #[error("no {0} context is current; called outside of a running evaluation")]
    Unavailable(&'static str),
}
