//! Micro-benchmarks for the reactive hot path: untracked reads, cached
//! computed reads, and the invalidate/recompute cycle.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cadence_core::reactive::{Computed, Signal};

fn signal_reads(c: &mut Criterion) {
    let signal = Signal::new(1.0_f64);

    c.bench_function("signal_get_untracked", |b| {
        b.iter(|| black_box(signal.get_untracked()))
    });

    c.bench_function("signal_set", |b| {
        let mut value = 0.0;
        b.iter(|| {
            value += 1.0;
            signal.set(black_box(value));
        })
    });
}

fn computed_reads(c: &mut Criterion) {
    let signal = Signal::new(2.0_f64);

    let signal_clone = signal.clone();
    let computed = Computed::new(move || signal_clone.get() * signal_clone.get());
    let _ = computed.get();

    c.bench_function("computed_get_cached", |b| {
        b.iter(|| black_box(computed.get()))
    });

    c.bench_function("computed_invalidate_and_recompute", |b| {
        let mut value = 0.0;
        b.iter(|| {
            value += 1.0;
            signal.set(value);
            black_box(computed.get())
        })
    });
}

criterion_group!(benches, signal_reads, computed_reads);
criterion_main!(benches);
