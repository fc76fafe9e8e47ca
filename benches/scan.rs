//! Benchmarks for head-and-shoulders scanning.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shsd::prelude::*;

/// Instrument data: pivot indices plus raw times and prices
struct Series {
  pivots: Vec<usize>,
  times: Vec<f64>,
  prices: Vec<f64>,
}

impl Series {
  fn input(&self) -> SeriesInput<'_> {
    SeriesInput::new(&self.pivots, &self.times, &self.prices)
  }
}

/// Generate a zigzag with `n` pivots, four raw bars per leg
fn generate_series(n: usize) -> Series {
  let mut waypoints = Vec::with_capacity(n);
  let mut level = 100.0;

  for i in 0..n {
    let drift = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0; // Deterministic "random"
    let swing = 2.0 + ((i * 3) % 10) as f64 / 2.0;
    level += drift;
    waypoints.push(if i % 2 == 0 { level - swing } else { level + swing });
  }

  let step = 4;
  let mut prices = Vec::with_capacity(n * step);
  for pair in waypoints.windows(2) {
    for k in 0..step {
      prices.push(pair[0] + (pair[1] - pair[0]) * k as f64 / step as f64);
    }
  }
  prices.extend(waypoints.last());

  Series {
    pivots: (0..n).map(|k| k * step).collect(),
    times: (0..prices.len()).map(|t| t as f64).collect(),
    prices,
  }
}

fn bench_scan(c: &mut Criterion) {
  let series = generate_series(1000);

  let engine = EngineBuilder::new().with_all_defaults().build().unwrap();

  c.bench_function("scan_1000_pivots", |b| {
    b.iter(|| {
      let _ = black_box(engine.scan_input(black_box(series.input())));
    })
  });
}

fn bench_scaling(c: &mut Criterion) {
  let engine = EngineBuilder::new().with_all_defaults().build().unwrap();

  let mut group = c.benchmark_group("scaling");

  for size in [100, 500, 1000, 5000, 10000].iter() {
    let series = generate_series(*size);

    group.bench_with_input(BenchmarkId::new("scan", size), size, |b, _| {
      b.iter(|| {
        let _ = black_box(engine.scan_input(black_box(series.input())));
      })
    });
  }

  group.finish();
}

fn bench_classification(c: &mut Criterion) {
  let series = generate_series(10000);
  let raw = RawSeries::new(&series.times, &series.prices).unwrap();
  let pivots = PivotSeries::from_raw(&series.pivots, &raw).unwrap();

  let sequential =
    EngineBuilder::new().with_all_defaults().parallel_threshold(None).build().unwrap();
  let parallel =
    EngineBuilder::new().with_all_defaults().parallel_threshold(Some(0)).build().unwrap();

  let mut group = c.benchmark_group("classify_10000_pivots");
  group.bench_function("sequential", |b| {
    b.iter(|| {
      let _ = black_box(sequential.classify(black_box(&pivots)));
    })
  });
  group.bench_function("parallel", |b| {
    b.iter(|| {
      let _ = black_box(parallel.classify(black_box(&pivots)));
    })
  });
  group.finish();
}

fn bench_parallel_scan(c: &mut Criterion) {
  let s1 = generate_series(1000);
  let s2 = generate_series(1000);
  let s3 = generate_series(1000);
  let s4 = generate_series(1000);

  let engine = EngineBuilder::new().with_all_defaults().build().unwrap();

  let instruments: Vec<(&str, SeriesInput<'_>)> =
    vec![("SYM1", s1.input()), ("SYM2", s2.input()), ("SYM3", s3.input()), ("SYM4", s4.input())];

  c.bench_function("parallel_scan_4_instruments", |b| {
    b.iter(|| {
      let _ = black_box(scan_parallel(black_box(&engine), black_box(instruments.clone())));
    })
  });
}

criterion_group!(benches, bench_scan, bench_scaling, bench_classification, bench_parallel_scan,);

criterion_main!(benches);
