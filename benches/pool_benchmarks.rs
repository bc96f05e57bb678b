//! Pool benchmarks for grpcpool

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use grpcpool::{Pool, PoolConfig};
use grpcpool_testing::{ChurnConfig, MockConnection, MockDialer, run_churn};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

fn build_pool(
    rt: &tokio::runtime::Runtime,
    max_idle: usize,
    max_active: usize,
    streams: usize,
    reuse: bool,
) -> Pool<MockConnection> {
    let config = PoolConfig::<MockConnection>::new()
        .dialer(MockDialer::new())
        .max_idle(max_idle)
        .max_active(max_active)
        .max_concurrent_streams(streams)
        .reuse(reuse);
    rt.block_on(Pool::new("127.0.0.1:50051", config)).unwrap()
}

fn fast_path_benchmark(c: &mut Criterion) {
    let rt = runtime();
    let pool = build_pool(&rt, 8, 64, 64, true);

    let mut group = c.benchmark_group("pool_fast_path");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_release", |b| {
        b.to_async(&rt).iter(|| async {
            let conn = pool.get().await.unwrap();
            black_box(conn.value());
        });
    });

    group.bench_function("get_hold_64", |b| {
        b.to_async(&rt).iter(|| async {
            let mut held = Vec::with_capacity(64);
            for _ in 0..64 {
                held.push(pool.get().await.unwrap());
            }
            black_box(&held);
        });
    });

    group.bench_function("status", |b| {
        b.iter(|| black_box(pool.status()));
    });

    group.finish();
}

fn resize_benchmark(c: &mut Criterion) {
    let rt = runtime();

    let mut group = c.benchmark_group("pool_resize");

    for max_active in [4usize, 16, 64] {
        let pool = build_pool(&rt, 1, max_active, 1, true);
        group.throughput(Throughput::Elements(max_active as u64));

        group.bench_with_input(
            BenchmarkId::new("grow_shrink", max_active),
            &max_active,
            |b, &max_active| {
                b.to_async(&rt).iter(|| async {
                    let mut held = Vec::with_capacity(max_active);
                    for _ in 0..max_active {
                        held.push(pool.get().await.unwrap());
                    }
                    // Releasing the last handle shrinks back to one connection.
                    drop(held);
                });
            },
        );
    }

    group.finish();
}

fn contention_benchmark(c: &mut Criterion) {
    let rt = runtime();

    let mut group = c.benchmark_group("pool_contention");
    group.sample_size(20);

    for tasks in [8usize, 64, 256] {
        let pool = build_pool(&rt, 8, 64, 2, false);
        let churn = ChurnConfig::new(tasks, 10);
        group.throughput(Throughput::Elements((tasks * 10) as u64));

        group.bench_with_input(BenchmarkId::new("churn", tasks), &churn, |b, churn| {
            b.to_async(&rt).iter(|| async {
                black_box(run_churn(&pool, churn).await);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    fast_path_benchmark,
    resize_benchmark,
    contention_benchmark
);
criterion_main!(benches);
