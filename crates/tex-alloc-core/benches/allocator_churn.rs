use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use tex_alloc_core::prelude::*;

fn generate_sizes(count: usize, min_size: u32, max_size: u32) -> Vec<(u32, u32)> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    (0..count)
        .map(|_| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            (w, h)
        })
        .collect()
}

fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill");

    for count in [100, 1000, 5000] {
        let sizes = generate_sizes(count, 4, 48);
        group.throughput(Throughput::Elements(count as u64));

        for bias in [0u32, 2] {
            group.bench_with_input(
                BenchmarkId::new(format!("bias_{bias}"), count),
                &sizes,
                |b, sizes| {
                    b.iter(|| {
                        let mut atlas: AtlasAllocator =
                            AtlasAllocator::new(Size::splat(64), Size::splat(4096), bias);
                        for &(w, h) in sizes {
                            let _ = atlas.try_allocate(w, h);
                        }
                        black_box(atlas)
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_frame_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_churn");
    let sizes = generate_sizes(2000, 4, 32);

    // Steady state: each frame frees the oldest quarter and refills it.
    for pool_limit in [0usize, 256] {
        let cfg = AllocatorConfig::builder()
            .with_min_size(64, 64)
            .with_max_size(2048, 2048)
            .row_height_bias(2)
            .pool_limit(pool_limit)
            .build();
        group.bench_with_input(
            BenchmarkId::new("pool_limit", pool_limit),
            &sizes,
            |b, sizes| {
                b.iter_batched(
                    || {
                        let mut atlas: AtlasAllocator =
                            AtlasAllocator::from_config(&cfg).expect("valid config");
                        let live: Vec<Placement> = sizes
                            .iter()
                            .filter_map(|&(w, h)| atlas.try_allocate(w, h))
                            .collect();
                        (atlas, live)
                    },
                    |(mut atlas, mut live)| {
                        let quarter = live.len() / 4;
                        for p in live.drain(..quarter) {
                            atlas.free(p);
                        }
                        for &(w, h) in &sizes[..quarter] {
                            if let Some(p) = atlas.try_allocate(w, h) {
                                live.push(p);
                            }
                        }
                        black_box((atlas, live))
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_single_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_ops");
    let mut atlas: AtlasAllocator = AtlasAllocator::new(Size::splat(64), Size::splat(2048), 0);
    for &(w, h) in &generate_sizes(500, 8, 32) {
        let _ = atlas.try_allocate(w, h);
    }

    group.bench_function("allocate_free_existing_row", |b| {
        b.iter(|| {
            if let Some(p) = atlas.try_allocate(black_box(12), black_box(12)) {
                atlas.free(p);
            }
        });
    });

    group.bench_function("stats", |b| {
        b.iter(|| black_box(atlas.stats()));
    });

    group.finish();
}

criterion_group!(benches, bench_fill, bench_frame_churn, bench_single_ops);
criterion_main!(benches);
