use simple_objectpool::{
    FactoryResult, GenericPool, ObjectFactory, PoolConfiguration, PoolError, PoolObject,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const INIT_POOL_SIZE: usize = 5;

/// Every connection claims to equal every other one.
#[derive(Debug)]
struct Connection {
    id: usize,
}

impl PartialEq for Connection {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[derive(Default)]
struct ConnectionFactory {
    next: AtomicUsize,
}

impl ObjectFactory for ConnectionFactory {
    type Object = Connection;

    fn produce_object(&self, _pool: &GenericPool<Self>) -> FactoryResult<PoolObject<Connection>> {
        Ok(PoolObject::new(Connection {
            id: self.next.fetch_add(1, Ordering::SeqCst),
        }))
    }
}

fn pool(lifo: bool) -> GenericPool<ConnectionFactory> {
    let config = PoolConfiguration::builder()
        .with_initial_pool_size(INIT_POOL_SIZE)
        .with_max_wait(Duration::from_secs(2))
        .with_lifo(lifo)
        .build();
    GenericPool::new(ConnectionFactory::default(), config)
}

#[test]
fn initial_pool_size_is_idle() {
    let pool = pool(false);
    assert_eq!(pool.num_idle(), INIT_POOL_SIZE);
    assert_eq!(pool.num_active(), 0);
    assert_eq!(pool.num_created(), INIT_POOL_SIZE as u64);
}

#[test]
fn borrow_and_return_move_between_idle_and_active() {
    let pool = pool(false);

    let connection = pool.borrow_object().unwrap();
    assert_eq!(pool.num_idle(), INIT_POOL_SIZE - 1);
    assert_eq!(pool.num_active(), 1);

    pool.return_object(&connection).unwrap();
    assert_eq!(pool.num_idle(), INIT_POOL_SIZE);
    assert_eq!(pool.num_active(), 0);
}

#[test]
fn foreign_object_is_rejected() {
    let pool = pool(false);
    let stranger = Arc::new(Connection { id: 99 });

    assert!(matches!(pool.return_object(&stranger), Err(PoolError::UnknownResource)));
    assert_eq!(pool.num_idle(), INIT_POOL_SIZE);
}

#[test]
fn second_return_is_rejected() {
    let pool = pool(false);
    let connection = pool.borrow_object().unwrap();

    pool.return_object(&connection).unwrap();
    assert!(matches!(pool.return_object(&connection), Err(PoolError::DoubleReturn)));
    assert_eq!(pool.num_idle(), INIT_POOL_SIZE);
}

#[test]
fn lifo_reuses_most_recently_returned() {
    let pool = pool(true);

    let first = pool.borrow_object().unwrap();
    pool.return_object(&first).unwrap();
    let second = pool.borrow_object().unwrap();
    let third = pool.borrow_object().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(!Arc::ptr_eq(&first, &third));
}

#[test]
fn fifo_reuses_oldest_idle() {
    let pool = pool(false);

    let first = pool.borrow_object().unwrap();
    assert_eq!(first.id, 0);
    pool.return_object(&first).unwrap();

    let second = pool.borrow_object().unwrap();
    assert_eq!(second.id, 1);
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn overridden_equality_does_not_confuse_bookkeeping() {
    let pool = pool(false);
    let a = pool.borrow_object().unwrap();
    let b = pool.borrow_object().unwrap();
    assert_eq!(*a, *b);

    pool.return_object(&a).unwrap();
    pool.return_object(&b).unwrap();
    assert_eq!(pool.num_idle(), INIT_POOL_SIZE);
    assert_eq!(pool.num_destroyed(), 0);
}

#[test]
fn close_drains_and_refuses_borrows() {
    let pool = pool(false);
    pool.close();

    assert!(pool.is_closed());
    assert_eq!(pool.num_idle(), 0);
    assert_eq!(pool.num_destroyed(), INIT_POOL_SIZE as u64);
    assert!(matches!(pool.borrow_object(), Err(PoolError::PoolClosed)));
}

#[test]
fn close_then_create_repopulates() {
    let pool = pool(false);
    pool.close();
    assert_eq!(pool.num_idle(), 0);

    pool.create();
    assert!(!pool.is_closed());
    assert_eq!(pool.num_idle(), INIT_POOL_SIZE);
}

#[test]
fn object_borrowed_before_close_can_be_returned() {
    let pool = pool(false);
    let connection = pool.borrow_object().unwrap();
    pool.close();

    pool.return_object(&connection).unwrap();
    assert_eq!(pool.num_idle(), 0);
    assert_eq!(pool.num_active(), 0);
    assert_eq!(pool.num_destroyed(), INIT_POOL_SIZE as u64 + 1);
}

#[test]
fn clear_replaces_idle_objects_with_minimum() {
    let pool = pool(false);
    pool.clear().unwrap();

    assert_eq!(pool.num_idle(), pool.config().min_pool_idle_size());
    assert_eq!(pool.num_destroyed(), INIT_POOL_SIZE as u64);

    let connection = pool.borrow_object().unwrap();
    assert!(connection.id >= INIT_POOL_SIZE);
}

#[test]
fn created_count_never_decreases() {
    let pool = pool(false);
    let mut last = pool.num_created();
    let mut check = |pool: &GenericPool<ConnectionFactory>| {
        let now = pool.num_created();
        assert!(now >= last);
        last = now;
    };

    let connection = pool.borrow_object().unwrap();
    check(&pool);
    pool.return_object(&connection).unwrap();
    check(&pool);
    pool.clear().unwrap();
    check(&pool);
    pool.close();
    check(&pool);
    pool.create();
    check(&pool);

    assert_eq!(pool.num_created(), (INIT_POOL_SIZE * 2 + 1) as u64);
}

#[test]
fn max_object_idle_time_is_not_enforced() {
    let config = PoolConfiguration::builder()
        .with_initial_pool_size(2)
        .with_max_object_idle_time(Duration::from_millis(1))
        .build();
    let pool = GenericPool::new(ConnectionFactory::default(), config);

    std::thread::sleep(Duration::from_millis(20));
    assert_eq!(pool.num_idle(), 2);
    assert!(pool.borrow_object().is_ok());
    assert_eq!(pool.num_destroyed(), 0);
}
