//! Scene Driver
//!
//! The scene owns the authoritative virtual clock and the registry of
//! active threads. Advancing one frame resumes every due thread in stable
//! registration order, then fires the render event once all of them have
//! settled, so the render callback always observes final signal values for
//! that frame.
//!
//! Seeking is reconstruction, not rewinding: seeking backwards resets the
//! scene (threads rebuilt from the root task factory, owners notified to
//! restore signal defaults) and replays forward. The same frame sequence is
//! produced on every run.

use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::error::ContextError;
use crate::events::{EventDispatcher, Subscription};

use super::stack::ContextStack;
use super::thread::{TaskFn, Thread, ThreadId};
use super::time::{FrameRate, TimeEvents, TIME_EPSILON};

/// Playback state of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Paused,
    Playing,
    Seeking,
}

/// The virtual clock and playback state, shared with ambient lookups.
#[derive(Debug, Clone)]
pub struct Playback {
    time: f64,
    frame: u64,
    rate: FrameRate,
    state: PlaybackState,
}

impl Playback {
    pub fn new(rate: FrameRate) -> Self {
        Self {
            time: 0.0,
            frame: 0,
            rate,
            state: PlaybackState::Paused,
        }
    }

    /// Current virtual time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    pub fn frame_step(&self) -> f64 {
        self.rate.frame_step()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
    }

    fn advance_frame(&mut self) -> f64 {
        self.frame += 1;
        // Derive time from the frame counter instead of accumulating, so
        // rounding never drifts over long runs.
        self.time = self.rate.frames_to_seconds(self.frame);
        self.time
    }

    fn rewind(&mut self) {
        self.frame = 0;
        self.time = 0.0;
    }
}

/// Shared handle to a scene's playback.
pub type PlaybackHandle = Arc<RwLock<Playback>>;

thread_local! {
    static PLAYBACK_STACK: ContextStack<PlaybackHandle> = ContextStack::new("playback");
    static THREAD_STACK: ContextStack<ThreadId> = ContextStack::new("thread");
}

/// The playback currently driving evaluation on this thread.
pub fn current_playback() -> Result<PlaybackHandle, ContextError> {
    PLAYBACK_STACK.with(|stack| stack.current())
}

/// The cooperative thread currently executing on this thread.
pub fn current_thread_id() -> Result<ThreadId, ContextError> {
    THREAD_STACK.with(|stack| stack.current())
}

/// A scene: the clock, the thread registry, the timeline events, and the
/// render/reset hooks of the excluded rendering layer.
pub struct Scene {
    playback: PlaybackHandle,
    threads: Vec<Thread>,
    events: TimeEvents,
    root: Option<Arc<dyn Fn() -> TaskFn + Send + Sync>>,
    render: EventDispatcher<f64>,
    reset_event: EventDispatcher<()>,
}

impl Scene {
    pub fn new(rate: FrameRate) -> Self {
        Self {
            playback: Arc::new(RwLock::new(Playback::new(rate))),
            threads: Vec::new(),
            events: TimeEvents::new(),
            root: None,
            render: EventDispatcher::new(),
            reset_event: EventDispatcher::new(),
        }
    }

    /// Shared handle to this scene's playback.
    pub fn playback(&self) -> PlaybackHandle {
        Arc::clone(&self.playback)
    }

    pub fn time(&self) -> f64 {
        self.playback.read().expect("playback lock poisoned").time()
    }

    pub fn frame(&self) -> u64 {
        self.playback
            .read()
            .expect("playback lock poisoned")
            .frame()
    }

    pub fn frame_step(&self) -> f64 {
        self.playback
            .read()
            .expect("playback lock poisoned")
            .frame_step()
    }

    /// Register or move a named timeline event.
    pub fn set_time_event(&mut self, name: impl Into<String>, seconds: f64) {
        self.events.set(name, seconds);
    }

    pub fn time_events(&self) -> &TimeEvents {
        &self.events
    }

    /// Observe render passes. Dispatched with the frame's virtual time
    /// after every thread has settled for that frame.
    #[must_use = "dropping the subscription immediately removes the handler"]
    pub fn on_render<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&f64) + Send + Sync + 'static,
    {
        self.render.subscribe(handler)
    }

    /// Observe resets. Owners restore their signals' defaults here.
    #[must_use = "dropping the subscription immediately removes the handler"]
    pub fn on_reset<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&()) + Send + Sync + 'static,
    {
        self.reset_event.subscribe(handler)
    }

    /// Install the root task factory and spawn the root thread.
    ///
    /// The factory is re-invoked on every reset, which is what makes
    /// backward seeks deterministic.
    pub fn set_root<F>(&mut self, factory: F)
    where
        F: Fn() -> TaskFn + Send + Sync + 'static,
    {
        let factory = Arc::new(factory);
        self.threads.clear();
        self.threads.push(Thread::new("main", factory()));
        self.root = Some(factory);
    }

    /// Register an additional thread, starting at the current scene time.
    pub fn spawn(&mut self, name: impl Into<String>, task: TaskFn) -> ThreadId {
        let mut thread = Thread::new(name, task);
        // Late-registered threads begin at the present, not at zero.
        let now = self.time();
        if now > 0.0 {
            thread.set_time(now);
        }
        let id = thread.id();
        self.threads.push(thread);
        id
    }

    /// Whether every registered thread has completed.
    pub fn is_finished(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Advance the virtual clock by one frame and resume all due threads.
    ///
    /// Threads resume in stable registration order; children spawned during
    /// the frame are appended and run within the same frame. Completed
    /// threads are dropped from the registry. Once everything has settled,
    /// the render event fires.
    pub fn next_frame(&mut self) {
        let (time, step) = {
            let mut playback = self.playback.write().expect("playback lock poisoned");
            let time = playback.advance_frame();
            (time, playback.frame_step())
        };

        let _playback_guard = PLAYBACK_STACK.with(|stack| stack.push(self.playback()));

        let mut threads = std::mem::take(&mut self.threads);
        let mut index = 0;
        while index < threads.len() {
            let mut spawned = Vec::new();
            {
                let _thread_guard = THREAD_STACK.with(|stack| stack.push(threads[index].id()));
                threads[index].advance(time, step, &self.events, &mut spawned);
            }
            // Children join at the back and run later this same frame.
            threads.append(&mut spawned);
            index += 1;
        }
        threads.retain(|thread| !thread.is_done());
        self.threads = threads;

        debug!(frame = self.frame(), time, threads = self.threads.len(), "frame advanced");
        self.render.dispatch(&time);
    }

    /// Run frames until every thread completes, bounded by `max_frames`.
    ///
    /// The bound is the caller's responsibility: a wait that is never
    /// satisfied stalls its thread forever, and the engine deliberately has
    /// no deadlock detector. Returns the number of frames advanced.
    pub fn advance_to_end(&mut self, max_frames: u64) -> u64 {
        let mut advanced = 0;
        while !self.is_finished() && advanced < max_frames {
            self.next_frame();
            advanced += 1;
        }
        advanced
    }

    /// Seek to a virtual time.
    ///
    /// Forward seeks advance frame by frame. Backward seeks reset the scene
    /// and replay forward from zero, which yields the same state as a fresh
    /// run ever would at that time.
    pub fn seek(&mut self, seconds: f64) {
        let previous_state = {
            let mut playback = self.playback.write().expect("playback lock poisoned");
            let previous = playback.state();
            playback.set_state(PlaybackState::Seeking);
            previous
        };

        if seconds + TIME_EPSILON < self.time() {
            self.reset();
        }
        while self.time() + TIME_EPSILON < seconds {
            self.next_frame();
        }

        self.playback
            .write()
            .expect("playback lock poisoned")
            .set_state(previous_state);
    }

    /// Rewind to time zero and rebuild threads from the root factory.
    ///
    /// Dispatches the reset event so signal owners restore their defaults
    /// before any thread re-runs.
    pub fn reset(&mut self) {
        self.threads.clear();
        self.playback
            .write()
            .expect("playback lock poisoned")
            .rewind();
        self.reset_event.dispatch(&());
        if let Some(factory) = &self.root {
            self.threads.push(Thread::new("main", factory()));
        }
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("time", &self.time())
            .field("frame", &self.frame())
            .field("threads", &self.threads.len())
            .finish()
    }
}
