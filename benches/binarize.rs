use std::time::Instant;

use barscan::binarize::{binarize_row, binarize_row_adaptive, normalize_modules, runs};
use barscan::config::DecoderConfig;
use barscan::decoder::{FrameDecoder, SoftwareStrategy};
use barscan::one_d::synth;
use barscan::region::Region;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn noisy_row(width: usize, seed: u32) -> Vec<u8> {
    // полосы с LCG-шумом: стабильно между прогонами
    let mut x = seed;
    (0..width)
        .map(|i| {
            x = x.wrapping_mul(1664525).wrapping_add(1013904223);
            let v = ((x >> 24) & 0xFF) as u8;
            if (i / 7) % 2 == 0 {
                v.saturating_add(32)
            } else {
                v.saturating_sub(32)
            }
        })
        .collect()
}

fn bench_binarize(c: &mut Criterion) {
    let row = noisy_row(2048, 123);

    c.bench_function("binarize_row", |b| b.iter(|| black_box(binarize_row(black_box(&row)).len())));

    c.bench_function("binarize_row_adaptive", |b| {
        b.iter(|| black_box(binarize_row_adaptive(black_box(&row)).len()))
    });

    c.bench_function("runs + normalize_modules", |b| {
        b.iter(|| {
            let rl = runs(&binarize_row_adaptive(black_box(&row)));
            black_box(normalize_modules(&rl, 4).len())
        })
    });
}

fn bench_software_frame(c: &mut Criterion) {
    let Some(row) = synth::ean13_row("5901234123457", 3) else {
        return;
    };
    let frame = synth::frame_from_row(&row, 720, 500);
    let mut strategy = SoftwareStrategy::new(&DecoderConfig::default(), Region::default());

    c.bench_function("software_decode_frame", |b| {
        b.iter(|| black_box(strategy.decode(black_box(&frame), Instant::now()).len()))
    });
}

criterion_group!(benches, bench_binarize, bench_software_frame);
criterion_main!(benches);
