//! Performance benchmarks for order-kit
//!
//! This benchmark suite measures:
//! - InMemory backend operations (get, single-key commit)
//! - Order creation for growing line counts
//! - Contended order creation on one product
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use order_kit::backend::{InMemoryBackend, StoreBackend, WriteBatch};
use order_kit::models::{Money, OrderRequest, Product, User};
use order_kit::ShopService;
use std::hint::black_box;

// ============================================================================
// Fixtures
// ============================================================================

/// Shop with a rich buyer and `products` well-stocked products.
fn seeded_shop(rt: &tokio::runtime::Runtime, products: u64) -> ShopService<InMemoryBackend> {
    let shop = ShopService::new(InMemoryBackend::new());
    rt.block_on(async {
        shop.create(User::new(1, "Bench", Money::from(u32::MAX)))
            .await
            .expect("Failed to seed user");
        for id in 1..=products {
            shop.create(Product::new(id, format!("p{}", id), u32::MAX, Money::from(1)))
                .await
                .expect("Failed to seed product");
        }
    });
    shop
}

// ============================================================================
// Group 1: InMemory Backend Benchmarks
// ============================================================================

fn backend_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_backend");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 1_000, 10_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("commit", size), size, |b, &size| {
                let backend = InMemoryBackend::new();
                let value = vec![1u8; size];

                b.to_async(&rt).iter(|| async {
                    backend
                        .commit(WriteBatch::new().put(black_box("bench:1"), value.clone()))
                        .await
                        .expect("Failed to commit")
                });
            });

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_hit", size), size, |b, &size| {
                let backend = InMemoryBackend::new();
                rt.block_on(async {
                    backend
                        .commit(WriteBatch::new().put("bench:1", vec![1u8; size]))
                        .await
                        .expect("Failed to commit");
                });

                b.to_async(&rt)
                    .iter(|| async { backend.get(black_box("bench:1")).await });
            });
    }

    group.bench_function("get_miss", |b| {
        let backend = InMemoryBackend::new();

        b.to_async(&rt)
            .iter(|| async { backend.get(black_box("bench:missing")).await });
    });

    group.finish();
}

// ============================================================================
// Group 2: Order Workflow Benchmarks
// ============================================================================

fn order_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_order");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for lines in [1u64, 5, 20].iter() {
        group
            .throughput(Throughput::Elements(*lines))
            .bench_with_input(BenchmarkId::new("lines", lines), lines, |b, &lines| {
                let shop = seeded_shop(&rt, lines);

                b.to_async(&rt).iter(|| async {
                    let mut request = OrderRequest::new(1);
                    for id in 1..=lines {
                        request = request.item(id, 1);
                    }
                    shop.create_order(black_box(request))
                        .await
                        .expect("Failed to create order")
                });
            });
    }

    group.bench_function("contended_8_tasks", |b| {
        let shop = seeded_shop(&rt, 1);

        b.to_async(&rt).iter(|| async {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let shop = shop.clone();
                    tokio::spawn(async move {
                        shop.create_order(OrderRequest::new(1).item(1, 1)).await
                    })
                })
                .collect();

            for handle in handles {
                // Conflicts past the retry limit are part of what is measured.
                let _ = handle.await.expect("Task failed");
            }
        });
    });

    group.finish();
}

criterion_group!(benches, backend_benchmarks, order_benchmarks);
criterion_main!(benches);
