use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use segalloc::Heap;

pub fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocator churn");
    group.sample_size(50);

    for size in [16usize, 64, 256, 1024, 4096] {
        group.bench_function(BenchmarkId::new("alloc_free", size), |b| {
            b.iter_batched_ref(
                || Heap::new(64 * 1024 * 1024),
                |heap| {
                    for _ in 0..1000 {
                        let p = heap.malloc(size);
                        heap.free(p);
                    }
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.bench_function("mixed_lifetimes", |b| {
        b.iter_batched_ref(
            || Heap::new(64 * 1024 * 1024),
            |heap| {
                let mut live = Vec::with_capacity(128);
                for round in 0..1024usize {
                    let size = 24 + (round * 53) % 2048;
                    live.push(heap.malloc(size));
                    if live.len() == 128 {
                        for p in live.drain(..).rev() {
                            heap.free(p);
                        }
                    }
                }
                for p in live.drain(..) {
                    heap.free(p);
                }
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_churn);
criterion_main!(benches);
