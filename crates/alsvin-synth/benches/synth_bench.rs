//! Benchmarks for the synthesis kernels.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use alsvin_device::Device;
use alsvin_ir::Angle;
use alsvin_synth::{LinearOp, gauss_jordan, gray_synth, steiner_gauss};

/// Deterministic pseudo-random invertible matrix, built as a product of
/// elementary row operations.
fn scrambled(n: usize, seed: u64) -> LinearOp {
    let mut state = seed;
    let mut step = || {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        (state >> 33) as usize
    };

    let mut mat = LinearOp::identity(n);
    for _ in 0..n * n {
        let c = step() % n;
        let t = step() % n;
        if c != t {
            mat.add_row(c, t);
        }
    }
    mat
}

fn bench_gauss_jordan(criterion: &mut Criterion) {
    let mat = scrambled(16, 0xA1);
    criterion.bench_function("gauss_jordan_16", |b| {
        b.iter(|| gauss_jordan(black_box(mat.clone())));
    });
}

fn bench_steiner_gauss(criterion: &mut Criterion) {
    let device = Device::grid(4, 4);
    let mat = scrambled(16, 0xB2);
    criterion.bench_function("steiner_gauss_4x4_grid", |b| {
        b.iter(|| steiner_gauss(black_box(&mat), &device).unwrap());
    });
}

fn bench_gray_synth(criterion: &mut Criterion) {
    let n = 8;
    let mut state = 0xC3u64;
    let mut step = || {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        (state >> 33) as usize
    };

    let terms: Vec<(Vec<bool>, Angle)> = (0..32)
        .map(|_| {
            let mut parity = vec![false; n];
            for bit in parity.iter_mut() {
                *bit = step() % 2 == 1;
            }
            if !parity.iter().any(|&b| b) {
                parity[0] = true;
            }
            (parity, Angle::PI_QUARTER)
        })
        .collect();

    criterion.bench_function("gray_synth_8x32", |b| {
        b.iter(|| gray_synth(black_box(&terms), LinearOp::identity(n)));
    });
}

criterion_group!(
    benches,
    bench_gauss_jordan,
    bench_steiner_gauss,
    bench_gray_synth
);
criterion_main!(benches);
