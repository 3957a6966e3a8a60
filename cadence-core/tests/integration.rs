//! Integration Tests
//!
//! These tests verify that the reactive engine and the playback scheduler
//! work together: signals written by cooperative threads invalidate
//! computed values, tweens land exactly, and playback stays deterministic
//! across seeks.

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use cadence_core::log::{set_log_sink, CapturingSink};
use cadence_core::playback::{task, FrameRate, Scene, Step, TaskSeq, TIME_EPSILON};
use cadence_core::reactive::{Computed, CompoundSignal, Signal, Vec2};
use cadence_core::tween::ease_in_out_cubic;

fn ten_fps() -> FrameRate {
    FrameRate::new(10.0)
}

// The logger sink is process-wide; tests that install their own sink take
// this lock so concurrent tests don't observe each other's sink.
static SINK_GUARD: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Memoization: with no upstream mutation, the factory runs exactly once
/// across repeated reads.
#[test]
fn computed_memoizes_between_invalidations() {
    let signal = Signal::new(3);
    let calls = Arc::new(AtomicI32::new(0));

    let calls_clone = calls.clone();
    let signal_clone = signal.clone();
    let squared = Computed::new(move || {
        calls_clone.fetch_add(1, Ordering::SeqCst);
        let v = signal_clone.get();
        v * v
    });

    for _ in 0..10 {
        assert_eq!(squared.get(), Some(9));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    signal.set(4);
    for _ in 0..10 {
        assert_eq!(squared.get(), Some(16));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// Dirty propagation: a signal write inside a scheduled task marks the
/// computed value dirty; the render pass reads the settled result.
#[test]
fn thread_writes_flow_into_computed_values() {
    let radius = Signal::new(1.0_f64);

    let radius_clone = radius.clone();
    let area = Computed::new(move || {
        let r = radius_clone.get();
        std::f64::consts::PI * r * r
    });
    assert_eq!(area.get(), Some(std::f64::consts::PI));

    let mut scene = Scene::new(ten_fps());
    let radius_clone = radius.clone();
    scene.spawn(
        "grow",
        TaskSeq::new()
            .wait_for(0.5)
            .run(move |_| radius_clone.set(2.0))
            .build(),
    );

    let rendered = Arc::new(RwLock::new(Vec::new()));
    let rendered_clone = rendered.clone();
    let area_clone = area.clone();
    let _sub = scene.on_render(move |_time| {
        rendered_clone
            .write()
            .unwrap()
            .push(area_clone.get().unwrap());
    });

    scene.advance_to_end(100);

    let rendered = rendered.read().unwrap();
    assert!((rendered.first().unwrap() - std::f64::consts::PI).abs() < 1e-9);
    assert!((rendered.last().unwrap() - 4.0 * std::f64::consts::PI).abs() < 1e-9);
}

/// Thread time monotonicity: sequential waits accumulate exactly,
/// independent of frame granularity.
#[test]
fn sequential_waits_land_on_exact_times() {
    for fps in [10.0, 24.0, 30.0, 60.0] {
        let reached = Arc::new(RwLock::new(None));

        let mut scene = Scene::new(FrameRate::new(fps));
        let reached_clone = reached.clone();
        scene.spawn(
            "waits",
            TaskSeq::new()
                .wait_for(2.0)
                .wait_for(3.0)
                .run(move |ctx| {
                    *reached_clone.write().unwrap() = Some(ctx.time());
                })
                .build(),
        );

        scene.advance_to_end(1000);
        assert_eq!(reached.read().unwrap().unwrap(), 5.0, "at {fps} fps");
    }
}

/// Compound fan-out: a whole-value write is observable through the
/// children and reassembles structurally equal.
#[test]
fn compound_signal_fans_out_and_reassembles() {
    let position = CompoundSignal::new(Vec2::ZERO);

    position.set(Vec2::new(7.0, 3.0));

    assert_eq!(position.child("x").unwrap().get(), 7.0);
    assert_eq!(position.child("y").unwrap().get(), 3.0);
    assert_eq!(position.get(), Vec2::new(7.0, 3.0));
}

/// Fault isolation: one failing factory keeps its stale value and does not
/// disturb unrelated computations evaluated on the same pass.
#[test]
fn faulty_computed_is_isolated_from_the_graph() {
    let _lock = SINK_GUARD.lock().unwrap_or_else(|e| e.into_inner());
    let sink = Arc::new(CapturingSink::new());
    let previous = set_log_sink(sink.clone());

    let input = Signal::new(1);
    let fail = Signal::new(false);

    let input_clone = input.clone();
    let fail_clone = fail.clone();
    let fragile = Computed::fallible(move || {
        let v = input_clone.get();
        if fail_clone.get() {
            return Err("intentional failure".into());
        }
        Ok(v * 10)
    })
    .with_key("demo.fragile");

    let input_clone = input.clone();
    let sturdy = Computed::new(move || input_clone.get() + 1);

    assert_eq!(fragile.get(), Some(10));
    assert_eq!(sturdy.get(), Some(2));

    fail.set(true);
    input.set(5);

    // The failing value keeps its last good result.
    assert_eq!(fragile.get(), Some(10));
    // Unrelated computations on the same pass are unaffected.
    assert_eq!(sturdy.get(), Some(6));

    let reported = sink
        .records()
        .iter()
        .any(|r| r.message.contains("intentional failure"));
    assert!(reported, "fault should reach the logger sink");

    set_log_sink(previous);
}

/// Tweens write through interpolation and land exactly on the target,
/// with easing applied to progress.
#[test]
fn eased_tween_reaches_target_exactly() {
    let opacity = Signal::new(0.0_f64);

    let mut scene = Scene::new(ten_fps());
    let spec = opacity.tween(1.0, 0.6).ease(ease_in_out_cubic);
    scene.spawn("fade", task::tween(spec));

    let samples = Arc::new(RwLock::new(Vec::new()));
    let samples_clone = samples.clone();
    let opacity_clone = opacity.clone();
    let _sub = scene.on_render(move |_| {
        samples_clone.write().unwrap().push(opacity_clone.get());
    });

    scene.advance_to_end(100);

    assert_eq!(opacity.get(), 1.0);
    let samples = samples.read().unwrap();
    for window in samples.windows(2) {
        assert!(window[1] >= window[0] - TIME_EPSILON, "opacity regressed");
    }
}

/// wait_until resolves through the scene's named timeline events.
#[test]
fn wait_until_uses_timeline_events() {
    let mut scene = Scene::new(ten_fps());
    scene.set_time_event("drop", 0.7);

    let fired_at = Arc::new(RwLock::new(None));
    let fired_clone = fired_at.clone();
    scene.spawn(
        "cue",
        TaskSeq::new()
            .wait_until("drop")
            .run(move |ctx| {
                *fired_clone.write().unwrap() = Some(ctx.time());
            })
            .build(),
    );

    scene.advance_to_end(100);
    assert_eq!(fired_at.read().unwrap().unwrap(), 0.7);
}

/// An unknown timeline event is reported and resolves to zero instead of
/// stalling the thread.
#[test]
fn unknown_time_event_is_reported_not_fatal() {
    let _lock = SINK_GUARD.lock().unwrap_or_else(|e| e.into_inner());
    let sink = Arc::new(CapturingSink::new());
    let previous = set_log_sink(sink.clone());

    let mut scene = Scene::new(ten_fps());
    let completed = Arc::new(AtomicUsize::new(0));
    let completed_clone = completed.clone();
    scene.spawn(
        "cue",
        TaskSeq::new()
            .wait_until("missing-event")
            .run(move |_| {
                completed_clone.fetch_add(1, Ordering::SeqCst);
            })
            .build(),
    );

    scene.advance_to_end(10);
    assert_eq!(completed.load(Ordering::SeqCst), 1);
    assert!(sink
        .records()
        .iter()
        .any(|r| r.message.contains("missing-event")));

    set_log_sink(previous);
}

/// Seeking is deterministic: seeking to a time produces the same signal
/// state as a fresh run advanced to that time.
#[test]
fn seek_matches_fresh_run() {
    fn build_scene(value: &Signal<f64>) -> (Scene, cadence_core::Subscription) {
        let mut scene = Scene::new(ten_fps());
        let spec = value.tween(10.0, 1.0);
        let value_root = value.clone();
        scene.set_root(move || {
            let value_inner = value_root.clone();
            TaskSeq::new()
                .tween(spec.clone())
                .wait_for(0.5)
                .run(move |_| value_inner.set(-1.0))
                .build()
        });
        let reset_value = value.clone();
        let reset_hook = scene.on_reset(move |_| reset_value.reset());
        (scene, reset_hook)
    }

    // Fresh run to 0.8 seconds.
    let fresh = Signal::new(0.0_f64);
    let (mut fresh_scene, _fresh_hook) = build_scene(&fresh);
    fresh_scene.seek(0.8);

    // Run to the end, then seek back to 0.8.
    let replayed = Signal::new(0.0_f64);
    let (mut replayed_scene, _replayed_hook) = build_scene(&replayed);
    replayed_scene.advance_to_end(100);
    assert_eq!(replayed.get(), -1.0);
    replayed_scene.seek(0.8);

    assert_eq!(fresh.get(), replayed.get());
    assert_eq!(fresh_scene.frame(), replayed_scene.frame());
}

/// The driver round-robins: two threads advance in lockstep, in
/// registration order, within every frame.
#[test]
fn threads_multiplex_deterministically() {
    let mut scene = Scene::new(ten_fps());
    let log = Arc::new(RwLock::new(Vec::new()));

    for name in ["first", "second"] {
        let log = log.clone();
        let mut beats = 0;
        scene.spawn(
            name,
            Box::new(move |ctx| {
                if beats == 3 {
                    return Step::Done;
                }
                beats += 1;
                log.write().unwrap().push((name, ctx.time()));
                Step::WaitFor(0.3)
            }),
        );
    }

    scene.advance_to_end(100);

    let log = log.read().unwrap();
    // Per beat, "first" always precedes "second" at the same thread time.
    for beat in 0..3 {
        let first = log[beat * 2];
        let second = log[beat * 2 + 1];
        assert_eq!(first.0, "first");
        assert_eq!(second.0, "second");
        assert_eq!(first.1, second.1);
    }
}

/// Signal defaults and scene reset cooperate for replayable state.
#[test]
fn reset_restores_signal_defaults_before_replay() {
    let opacity = Signal::builder(0.25_f64)
        .parser(|v| v.clamp(0.0, 1.0))
        .build();

    let mut scene = Scene::new(ten_fps());
    let opacity_task = opacity.clone();
    scene.set_root(move || {
        let opacity = opacity_task.clone();
        TaskSeq::new()
            .wait_for(0.3)
            .run(move |_| opacity.set(0.9))
            .build()
    });
    let opacity_reset = opacity.clone();
    let _sub = scene.on_reset(move |_| opacity_reset.reset());

    scene.advance_to_end(100);
    assert_eq!(opacity.get(), 0.9);

    scene.seek(0.1);
    assert_eq!(opacity.get(), 0.25);
}
