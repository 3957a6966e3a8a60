//! Task Combinators
//!
//! Builders for the common task shapes: timed waits, named-event waits,
//! immediate actions, sequential composition, parallel groups, and signal
//! tweens. A composed task is still a single resumable state machine; the
//! combinators only thread the `Step` protocol through.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::reactive::TweenSpec;
use crate::tween::Lerp;

use super::thread::{Step, TaskCtx, TaskFn};

/// Suspend for `seconds` of thread time, then complete.
pub fn wait_for(seconds: f64) -> TaskFn {
    let mut waited = false;
    Box::new(move |_ctx| {
        if !waited {
            waited = true;
            Step::WaitFor(seconds)
        } else {
            Step::Done
        }
    })
}

/// Suspend until the named timeline event, then complete.
pub fn wait_until(name: impl Into<String>) -> TaskFn {
    let name = name.into();
    let mut waited = false;
    Box::new(move |_ctx| {
        if !waited {
            waited = true;
            Step::WaitUntil(name.clone())
        } else {
            Step::Done
        }
    })
}

/// Run a closure once, then complete, without suspending.
pub fn run<F>(f: F) -> TaskFn
where
    F: FnOnce(&mut TaskCtx<'_>) + Send + 'static,
{
    let mut f = Some(f);
    Box::new(move |ctx| {
        if let Some(f) = f.take() {
            f(ctx);
        }
        Step::Done
    })
}

/// Run tasks one after another; each child's waits pass through unchanged.
pub fn sequence(tasks: Vec<TaskFn>) -> TaskFn {
    let mut tasks = tasks;
    let mut index = 0;
    Box::new(move |ctx| {
        while index < tasks.len() {
            match (tasks[index])(ctx) {
                Step::Done => index += 1,
                step => return step,
            }
        }
        Step::Done
    })
}

/// Run tasks as concurrently-scheduled child threads; complete when every
/// child has completed.
pub fn all(tasks: Vec<TaskFn>) -> TaskFn {
    let mut pending = Some(tasks);
    let completed = Arc::new(AtomicUsize::new(0));
    let mut total = 0;
    Box::new(move |ctx| {
        if let Some(tasks) = pending.take() {
            total = tasks.len();
            for (i, task) in tasks.into_iter().enumerate() {
                let completed = Arc::clone(&completed);
                let mut task = task;
                ctx.spawn(
                    format!("all[{i}]"),
                    Box::new(move |ctx| match task(ctx) {
                        Step::Done => {
                            completed.fetch_add(1, Ordering::SeqCst);
                            Step::Done
                        }
                        step => step,
                    }),
                );
            }
        }
        if completed.load(Ordering::SeqCst) >= total {
            Step::Done
        } else {
            Step::Yield
        }
    })
}

/// Drive a tween: one interpolated write per frame at increasing progress,
/// with the final write landing exactly on progress 1.
pub fn tween<T>(spec: TweenSpec<T>) -> TaskFn
where
    T: Lerp + Send + Sync + 'static,
{
    let mut started: Option<(T, f64)> = None;
    Box::new(move |ctx| {
        let duration = spec.duration();
        if duration <= 0.0 {
            let from = spec.signal().get_untracked();
            spec.write_at(&from, 1.0);
            return Step::Done;
        }

        let thread_time = ctx.time();
        let (from, start) =
            started.get_or_insert_with(|| (spec.signal().get_untracked(), thread_time));
        let progress = ((thread_time - *start) / duration).clamp(0.0, 1.0);
        spec.write_at(from, progress);

        if progress >= 1.0 {
            Step::Done
        } else {
            // Wait one frame, or less so the last write hits the target
            // time exactly.
            let remaining = (*start + duration) - thread_time;
            Step::WaitFor(remaining.min(ctx.frame_step()))
        }
    })
}

/// Builder for sequential tasks with trailing continuations.
///
/// ```rust,ignore
/// let task = TaskSeq::new()
///     .wait_for(2.0)
///     .run(|_| println!("two seconds in"))
///     .wait_until("drop")
///     .tween(opacity.tween(0.0, 0.5))
///     .build();
/// ```
#[derive(Default)]
pub struct TaskSeq {
    steps: Vec<TaskFn>,
}

impl TaskSeq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wait_for(mut self, seconds: f64) -> Self {
        self.steps.push(wait_for(seconds));
        self
    }

    pub fn wait_until(mut self, name: impl Into<String>) -> Self {
        self.steps.push(wait_until(name));
        self
    }

    /// Run a closure immediately after the preceding step resolves, without
    /// introducing an extra suspension point.
    pub fn run<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut TaskCtx<'_>) + Send + 'static,
    {
        self.steps.push(run(f));
        self
    }

    pub fn tween<T>(mut self, spec: TweenSpec<T>) -> Self
    where
        T: Lerp + Send + Sync + 'static,
    {
        self.steps.push(tween(spec));
        self
    }

    /// Append an arbitrary task.
    pub fn then(mut self, task: TaskFn) -> Self {
        self.steps.push(task);
        self
    }

    pub fn build(self) -> TaskFn {
        sequence(self.steps)
    }
}
