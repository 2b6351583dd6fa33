#[macro_use]
extern crate criterion;

use std::time::Duration;

use criterion::black_box;
use criterion::Criterion;

use mos2d_ramp::engine::{CompactEngine, MosfetParams};
use mos2d_ramp::{all_currents, ramp_bias, Collector, RampParams, SolveParams};

fn criterion_config() -> Criterion {
    Criterion::default()
        .measurement_time(Duration::from_secs(1))
        .sample_size(10)
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("gate ramp -3V to 5V", |b| {
        b.iter(|| {
            let mut engine = CompactEngine::new();
            let device = engine.create_device("mos2d", MosfetParams::default());
            ramp_bias(&mut engine, &device, "drain", &params(0.2), Collector::new(all_currents))
                .expect("drain ramp");
            ramp_bias(&mut engine, &device, "gate", &params(-3.0), Collector::new(all_currents))
                .expect("initial gate ramp");
            black_box(
                ramp_bias(&mut engine, &device, "gate", &params(5.0), Collector::new(all_currents))
                    .expect("gate ramp"),
            )
        })
    });
}

fn params(end_bias: f64) -> RampParams {
    RampParams::new(end_bias, 0.01, 0.001, SolveParams::new(100, 1e-8, 1e30))
}

criterion_group!(
  name = benches;
  config = criterion_config();
  targets = criterion_benchmark
);
criterion_main!(benches);
