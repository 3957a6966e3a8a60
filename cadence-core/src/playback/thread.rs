//! Cooperative Threads
//!
//! A thread is one unit of animation logic: a resumable task driven forward
//! in lockstep with the virtual clock. Suspension is cooperative; a task
//! runs until it reports a wait (or completion) and is resumed by the
//! driver on a later frame, never in parallel with anything else.
//!
//! # Time semantics
//!
//! Each thread carries its own logical time, advanced only by the
//! scheduler. When a wait's target comes within one frame step of the
//! scene's clock, the thread resumes and its time snaps to the exact
//! target. Animation arithmetic therefore composes exactly:
//! `wait_for(2)` then `wait_for(3)` always lands on thread time 5.0,
//! whatever the frame granularity. Thread time is monotonic and stays at
//! or ahead of the scene's authoritative time.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use super::time::{TimeEvents, TIME_EPSILON};

/// Counter for generating unique thread IDs.
static THREAD_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a cooperative thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(u64);

impl ThreadId {
    fn next() -> Self {
        Self(THREAD_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// What a task reports back to the driver from one resumption.
#[derive(Debug)]
pub enum Step {
    /// Keep running within the current tick.
    Continue,
    /// Suspend until the next frame.
    Yield,
    /// Suspend for the given number of seconds of thread time.
    WaitFor(f64),
    /// Suspend until the named timeline event.
    WaitUntil(String),
    /// The task is finished.
    Done,
}

/// A resumable task. Suspension points are exactly the `Step` variants it
/// returns; nothing else may suspend.
pub type TaskFn = Box<dyn FnMut(&mut TaskCtx<'_>) -> Step + Send>;

/// Execution context handed to a task on every resumption.
pub struct TaskCtx<'a> {
    pub(crate) thread_id: ThreadId,
    pub(crate) thread_time: f64,
    pub(crate) scene_time: f64,
    pub(crate) frame_step: f64,
    pub(crate) events: &'a TimeEvents,
    pub(crate) spawned: &'a mut Vec<Thread>,
}

impl TaskCtx<'_> {
    /// The running thread's logical time.
    pub fn time(&self) -> f64 {
        self.thread_time
    }

    /// The scene's authoritative virtual time.
    pub fn scene_time(&self) -> f64 {
        self.scene_time
    }

    pub fn frame_step(&self) -> f64 {
        self.frame_step
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Resolve a named timeline event to its time offset.
    pub fn resolve_event(&self, name: &str) -> f64 {
        self.events.resolve(name)
    }

    /// Spawn a child thread.
    ///
    /// The child starts at the spawning thread's time, joins the registry
    /// in registration order, and runs within the current frame.
    pub fn spawn(&mut self, name: impl Into<String>, task: TaskFn) -> ThreadId {
        let mut child = Thread::new(name, task);
        child.time = self.thread_time;
        let id = child.id;
        self.spawned.push(child);
        id
    }
}

/// Scheduling state of one thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThreadState {
    /// Runnable now.
    Ready,
    /// Suspended until `target` comes within one frame step of scene time.
    Waiting { target: f64 },
    /// Completed; will be removed from the registry.
    Done,
}

/// One cooperative thread: a task plus its scheduling state and logical time.
pub struct Thread {
    id: ThreadId,
    name: String,
    time: f64,
    state: ThreadState,
    task: TaskFn,
}

impl Thread {
    pub fn new(name: impl Into<String>, task: TaskFn) -> Self {
        Self {
            id: ThreadId::next(),
            name: name.into(),
            time: 0.0,
            state: ThreadState::Ready,
            task,
        }
    }

    pub fn id(&self) -> ThreadId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The thread's logical time.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn state(&self) -> ThreadState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ThreadState::Done
    }

    /// Move the thread's clock forward at registration time. Thread time
    /// never moves backwards.
    pub(crate) fn set_time(&mut self, time: f64) {
        debug_assert!(time >= self.time);
        self.time = time;
    }

    /// Drive this thread as far as it can go within the current frame.
    ///
    /// Resumes the task while its wait target is due, snapping thread time
    /// to each exact target before re-entering the task. Returns when the
    /// task suspends on a not-yet-due wait or completes.
    pub(crate) fn advance(
        &mut self,
        scene_time: f64,
        frame_step: f64,
        events: &TimeEvents,
        spawned: &mut Vec<Thread>,
    ) {
        loop {
            match self.state {
                ThreadState::Done => return,
                ThreadState::Waiting { target } => {
                    if target - frame_step > scene_time + TIME_EPSILON {
                        return;
                    }
                    // Due: snap to the exact target, not to the scene clock.
                    self.time = target;
                    self.state = ThreadState::Ready;
                }
                ThreadState::Ready => {
                    let step = {
                        let mut ctx = TaskCtx {
                            thread_id: self.id,
                            thread_time: self.time,
                            scene_time,
                            frame_step,
                            events,
                            spawned,
                        };
                        (self.task)(&mut ctx)
                    };
                    trace!(thread = %self.name, time = self.time, ?step, "thread step");
                    match step {
                        Step::Continue => {}
                        Step::Yield => {
                            self.state = ThreadState::Waiting {
                                target: self.time + frame_step,
                            };
                        }
                        Step::WaitFor(seconds) => {
                            self.state = ThreadState::Waiting {
                                target: self.time + seconds.max(0.0),
                            };
                        }
                        Step::WaitUntil(name) => {
                            // Never move backwards, even if the event is
                            // already in the past.
                            let target = events.resolve(&name).max(self.time);
                            self.state = ThreadState::Waiting { target };
                        }
                        Step::Done => {
                            self.state = ThreadState::Done;
                            return;
                        }
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Thread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("time", &self.time)
            .field("state", &self.state)
            .finish()
    }
}
