//! Benchmark: write propagation through signals, computed chains and the
//! membrane.

use std::cell::Cell;
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ripple_core::reactive::{Computed, Effect, Signal, TrackedSignal};
use ripple_core::value::Value;

fn benchmark_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");

    for subscribers in [1usize, 16, 256] {
        let signal = Signal::new(0u64);
        let total = Rc::new(Cell::new(0u64));
        let _effects: Vec<Effect> = (0..subscribers)
            .map(|_| {
                let signal = signal.clone();
                let total = total.clone();
                Effect::new(move || {
                    total.set(total.get().wrapping_add(signal.get()));
                    Ok(())
                })
                .unwrap()
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(subscribers), &subscribers, |b, _| {
            let mut next = 0u64;
            b.iter(|| {
                next += 1;
                signal.set(black_box(next)).unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_computed_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("computed_chain");

    for depth in [1usize, 8, 64] {
        let source = Signal::new(0u64);
        let mut chain: Vec<Computed<u64>> = Vec::with_capacity(depth);
        for level in 0..depth {
            let computed = match chain.last() {
                Some(previous) => {
                    let previous = previous.clone();
                    Computed::new(move || previous.get() + 1).unwrap()
                }
                None => {
                    let source = source.clone();
                    Computed::new(move || source.get() + level as u64).unwrap()
                }
            };
            chain.push(computed);
        }

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            let mut next = 0u64;
            b.iter(|| {
                next += 1;
                source.set(next).unwrap();
                black_box(chain.last().map(Computed::peek));
            });
        });
    }

    group.finish();
}

fn benchmark_nested_write(c: &mut Criterion) {
    let state = TrackedSignal::new(Value::object([(
        "user",
        Value::object([("profile", Value::object([("visits", 0)]))]),
    )]));
    let visits = Computed::new({
        let state = state.clone();
        move || state.get().get("user").get("profile").get("visits").as_f64()
    })
    .unwrap();

    c.bench_function("nested_write", |b| {
        let profile = state.peek().get("user").get("profile");
        let mut next = 0.0;
        b.iter(|| {
            next += 1.0;
            profile.set("visits", black_box(next)).unwrap();
        });
    });

    black_box(visits.peek());
}

criterion_group!(
    benches,
    benchmark_fan_out,
    benchmark_computed_chain,
    benchmark_nested_write
);
criterion_main!(benches);
