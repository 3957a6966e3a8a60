//! Playback and Scheduling
//!
//! This module implements the cooperative, deterministic execution model:
//! a virtual clock advanced one frame at a time, a registry of resumable
//! tasks ("threads") suspended on time-addressed waits, and the scene
//! driver that resumes them in stable order before triggering a render.
//!
//! Scheduling is single-threaded and cooperative. Suspension points are
//! exactly the wait steps a task returns; a task always runs to its next
//! suspension point before anything else happens. There is no preemption,
//! no wall clock, and no deadlock detection: a wait that is never
//! satisfied surfaces as an animation that never completes, which is the
//! caller's bug to fix.

mod scene;
mod stack;
pub mod task;
mod thread;
mod time;

pub use scene::{
    current_playback, current_thread_id, Playback, PlaybackHandle, PlaybackState, Scene,
};
pub use stack::{ContextStack, StackGuard};
pub use task::TaskSeq;
pub use thread::{Step, TaskCtx, TaskFn, Thread, ThreadId, ThreadState};
pub use time::{FrameRate, TimeEvents, TIME_EPSILON};
