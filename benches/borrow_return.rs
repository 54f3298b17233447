//! Benchmark: borrow/return round trips, single-threaded and contended

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use simple_objectpool::{FactoryResult, GenericPool, ObjectFactory, PoolConfiguration, PoolObject};
use std::sync::Arc;
use std::thread;

struct Buffers;

impl ObjectFactory for Buffers {
    type Object = Vec<u8>;

    fn produce_object(&self, _pool: &GenericPool<Self>) -> FactoryResult<PoolObject<Vec<u8>>> {
        Ok(PoolObject::new(vec![0; 1024]))
    }
}

fn pool(size: usize, lifo: bool) -> GenericPool<Buffers> {
    let config = PoolConfiguration::builder()
        .with_initial_pool_size(size)
        .with_min_pool_idle_size(0)
        .with_unbounded_wait()
        .with_lifo(lifo)
        .build();
    GenericPool::new(Buffers, config)
}

fn benchmark_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");

    for (name, lifo) in [("fifo", false), ("lifo", true)] {
        let pool = pool(16, lifo);
        group.bench_function(name, |b| {
            b.iter(|| {
                let buffer = pool.borrow_object().unwrap();
                black_box(buffer.len());
                pool.return_object(&buffer).unwrap();
            });
        });
    }

    let pool = pool(16, false);
    group.bench_function("guard", |b| {
        b.iter(|| {
            let buffer = pool.get_object().unwrap();
            black_box(buffer.len());
        });
    });

    group.finish();
}

fn benchmark_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("contention");

    for threads in [2, 4, 8] {
        let pool = Arc::new(pool(4, false));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let pool = Arc::clone(&pool);
                        thread::spawn(move || {
                            for _ in 0..100 {
                                let buffer = pool.borrow_object().unwrap();
                                black_box(buffer.len());
                                pool.return_object(&buffer).unwrap();
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_round_trip, benchmark_contention);
criterion_main!(benches);
