//! Basic usage of GenericPool

use simple_objectpool::{
    FactoryResult, GenericPool, MetricsExporter, ObjectFactory, PoolConfiguration, PoolObject,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// Hands out numbered buffers.
#[derive(Default)]
struct BufferFactory {
    next: AtomicUsize,
}

#[derive(Debug)]
struct Buffer {
    id: usize,
    data: Vec<u8>,
}

impl ObjectFactory for BufferFactory {
    type Object = Buffer;

    fn produce_object(&self, _pool: &GenericPool<Self>) -> FactoryResult<PoolObject<Buffer>> {
        Ok(PoolObject::new(Buffer {
            id: self.next.fetch_add(1, Ordering::Relaxed),
            data: Vec::with_capacity(4096),
        }))
    }
}

fn main() {
    println!("=== simple_objectpool - Basic Examples ===\n");

    borrow_and_return();
    guarded_borrow();
    exhausted_pool();
    lifecycle();
    metrics_and_health();
}

fn pool(lifo: bool) -> GenericPool<BufferFactory> {
    let config = PoolConfiguration::builder()
        .with_initial_pool_size(3)
        .with_max_pool_size(4)
        .with_max_pool_idle_size(4)
        .with_min_pool_idle_size(1)
        .with_max_wait(Duration::from_millis(200))
        .with_lifo(lifo)
        .build();
    GenericPool::new(BufferFactory::default(), config)
}

fn borrow_and_return() {
    println!("1. Borrow and return:");
    let pool = pool(true);

    let buffer = pool.borrow_object().unwrap();
    println!("   Got buffer {} ({} bytes reserved)", buffer.id, buffer.data.capacity());
    println!("   Active: {}, idle: {}", pool.num_active(), pool.num_idle());

    pool.return_object(&buffer).unwrap();
    let again = pool.borrow_object().unwrap();
    println!("   LIFO hands back the same buffer: {}", Arc::ptr_eq(&buffer, &again));

    pool.return_object(&again).unwrap();
    println!("   Returning it twice: {}\n", pool.return_object(&again).unwrap_err());
}

fn guarded_borrow() {
    println!("2. Guarded borrow:");
    let pool = pool(false);

    {
        let buffer = pool.get_object().unwrap();
        println!("   Got buffer {}", buffer.id);
        // Returned when `buffer` goes out of scope
    }

    println!("   Idle after the guard dropped: {}\n", pool.num_idle());
}

fn exhausted_pool() {
    println!("3. Exhausted pool:");
    let pool = Arc::new(pool(false));

    let held: Vec<_> = (0..4).map(|_| pool.borrow_object().unwrap()).collect();
    println!("   Borrowed {} buffers, created {}", held.len(), pool.num_created());

    match pool.borrow_object() {
        Ok(_) => println!("   Unexpected borrow"),
        Err(e) => println!("   Fifth borrow: {e}"),
    }

    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.borrow_object_with_timeout(None).map(|b| b.id))
    };
    thread::sleep(Duration::from_millis(50));
    pool.return_object(&held[0]).unwrap();
    println!("   Waiting thread received buffer {}\n", waiter.join().unwrap().unwrap());
}

fn lifecycle() {
    println!("4. Clear, close and create:");
    let pool = pool(false);

    pool.clear().unwrap();
    println!("   After clear: idle {}, destroyed {}", pool.num_idle(), pool.num_destroyed());

    pool.close();
    println!("   After close: closed {}, idle {}", pool.is_closed(), pool.num_idle());
    println!("   Borrow on closed pool: {}", pool.borrow_object().unwrap_err());

    pool.create();
    println!("   After create: idle {}, created {}\n", pool.num_idle(), pool.num_created());
}

fn metrics_and_health() {
    println!("5. Metrics and health:");
    let pool = pool(false);
    let _a = pool.get_object().unwrap();
    let _b = pool.get_object().unwrap();

    let metrics = pool.metrics();
    println!("   Borrowed: {}", metrics.total_borrowed);
    println!("   Utilization: {:.0}%", metrics.utilization * 100.0);

    let health = pool.health_status();
    println!("   Healthy: {}, warnings: {:?}", health.is_healthy(), health.warnings);

    let text = MetricsExporter::export_prometheus(&metrics, "buffers", None).unwrap();
    println!("   Prometheus:");
    for line in text.lines().filter(|l| !l.starts_with('#')) {
        println!("     {line}");
    }
}
