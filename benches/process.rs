use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use planarize::wind::EvenOdd;
use planarize::{process, FillStyle, Point, Polygon, WindContext};

fn random_rects<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Polygon {
  let mut poly = Polygon::new(1.0);
  for _ in 0..n {
    let x = rng.gen_range(0..10_000);
    let y = rng.gen_range(0..10_000);
    let w = rng.gen_range(1..500);
    let h = rng.gen_range(1..500);
    let rect = Polygon::from_path(
      1.0,
      FillStyle::SOLID,
      &[
        Point::new(x, y),
        Point::new(x + w, y),
        Point::new(x + w, y + h),
        Point::new(x, y + h),
      ],
    );
    poly.strokes.extend(rect.strokes);
  }
  poly
}

fn random_triangles<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Polygon {
  let mut poly = Polygon::new(1.0);
  for _ in 0..n {
    let p = |rng: &mut R| Point::new(rng.gen_range(0..2_000), rng.gen_range(0..2_000));
    let tri = [p(rng), p(rng), p(rng)];
    poly
      .strokes
      .extend(Polygon::from_path(1.0, FillStyle::SOLID, &tri).strokes);
  }
  poly
}

pub fn criterion_benchmark(c: &mut Criterion) {
  let mut rng = SmallRng::seed_from_u64(1);
  let ctx = WindContext::new(1);

  for n in [10, 100, 1000] {
    let poly = random_rects(n, &mut rng);
    c.bench_function(&format!("process_rects(1e{})", n.ilog10()), |b| {
      b.iter_batched(
        || poly.clone(),
        |poly| process(&[&poly], &EvenOdd, &ctx),
        BatchSize::SmallInput,
      )
    });
  }

  for n in [10, 100] {
    let poly = random_triangles(n, &mut rng);
    c.bench_function(&format!("process_triangles(1e{})", n.ilog10()), |b| {
      b.iter_batched(
        || poly.clone(),
        |poly| process(&[&poly], &EvenOdd, &ctx),
        BatchSize::SmallInput,
      )
    });
  }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
