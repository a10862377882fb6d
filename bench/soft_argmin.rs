use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cv_stereonet::prelude::*;
use ndarray::Array4;

fn cost_volume_bench(c: &mut Criterion) {

    // Feature maps at a quarter of a 256 x 256 tile
    let left = Array4::from_shape_fn((1, 64, 64, 32), |(_, y, x, ch)| {
        ((y * 31 + x * 17 + ch * 7) % 97) as f32 / 97.0
    });
    let right = Array4::from_shape_fn((1, 64, 64, 32), |(_, y, x, ch)| {
        ((y * 31 + (x + 3) * 17 + ch * 7) % 97) as f32 / 97.0
    });

    c.bench_function("concat_volume 64x64x32 d16", |b| {
        b.iter(|| concat_volume(black_box(left.view()), black_box(right.view()), 16))
    });

    c.bench_function("difference_volume 64x64x32 d8", |b| {
        b.iter(|| difference_volume(black_box(left.view()), black_box(right.view()), 8))
    });
}

fn soft_argmin_bench(c: &mut Criterion) {

    // Regularised costs for a full 256 x 256 tile
    let range = DisparityRange::Signed { max_disp: 32 };
    let cost = Array4::from_shape_fn((1, range.len(), 256, 256), |(_, d, y, x)| {
        ((d * 13 + y * 7 + x * 3) % 29) as f32 * 0.25
    });

    c.bench_function("soft_argmin 256x256 d64", |b| {
        b.iter(|| soft_argmin(black_box(cost.view()), range))
    });
}

criterion_group!(benches, cost_volume_bench, soft_argmin_bench);
criterion_main!(benches);
