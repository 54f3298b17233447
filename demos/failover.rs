//! A pool of simulated connections that fails over to backup endpoints.
//!
//! The pool knows nothing about endpoints: the whole failover policy lives in
//! the factory. After `failures_to_fallback` failed attempts on the primary,
//! the factory switches to the ranked backups. With `eager_retry` every new
//! connection tries the primary first even in fallback mode.

use parking_lot::Mutex;
use simple_objectpool::{
    FactoryResult, GenericPool, ObjectFactory, PoolConfiguration, PoolObject, TracingEventSink,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
enum ConnectError {
    #[error("endpoint {0} is unreachable")]
    Unreachable(String),

    #[error("primary endpoint is unreachable and no backups are configured")]
    NoBackups,

    #[error("no endpoint could be reached")]
    Exhausted,
}

/// How a connection is cleaned up when it goes back to the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReturnStrategy {
    Commit,
    Rollback,
    None,
}

struct Endpoint {
    name: String,
    up: AtomicBool,
}

impl Endpoint {
    fn new(name: &str, up: bool) -> Self {
        Self {
            name: name.to_string(),
            up: AtomicBool::new(up),
        }
    }

    fn connect(&self) -> Result<Connection, ConnectError> {
        if !self.up.load(Ordering::SeqCst) {
            return Err(ConnectError::Unreachable(self.name.clone()));
        }
        Ok(Connection {
            endpoint: self.name.clone(),
            open: AtomicBool::new(true),
            pending: Mutex::new(Vec::new()),
            committed: AtomicUsize::new(0),
        })
    }
}

#[derive(Debug)]
struct Connection {
    endpoint: String,
    open: AtomicBool,
    pending: Mutex<Vec<String>>,
    committed: AtomicUsize,
}

impl Connection {
    fn execute(&self, statement: &str) {
        self.pending.lock().push(statement.to_string());
    }

    fn commit(&self) {
        let mut pending = self.pending.lock();
        self.committed.fetch_add(pending.len(), Ordering::SeqCst);
        pending.clear();
    }

    fn rollback(&self) {
        self.pending.lock().clear();
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

struct FailoverFactory {
    primary: Endpoint,
    /// Tried in order
    backups: Vec<Endpoint>,
    failures_to_fallback: usize,
    eager_retry: bool,
    strategy: ReturnStrategy,
    failures: AtomicUsize,
    in_fallback: AtomicBool,
}

impl FailoverFactory {
    fn new(primary: Endpoint, backups: Vec<Endpoint>) -> Self {
        Self {
            primary,
            backups,
            failures_to_fallback: 3,
            eager_retry: false,
            strategy: ReturnStrategy::Rollback,
            failures: AtomicUsize::new(0),
            in_fallback: AtomicBool::new(false),
        }
    }

    fn with_eager_retry(mut self, eager_retry: bool) -> Self {
        self.eager_retry = eager_retry;
        self
    }

    fn with_strategy(mut self, strategy: ReturnStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    fn in_fallback(&self) -> bool {
        self.in_fallback.load(Ordering::SeqCst)
    }

    fn connect(&self) -> Result<Connection, ConnectError> {
        while !self.in_fallback() {
            match self.primary.connect() {
                Ok(connection) => return Ok(connection),
                Err(e) => {
                    let failures = self.failures.fetch_add(1, Ordering::SeqCst) + 1;
                    tracing::warn!("{e} (attempt {failures}/{})", self.failures_to_fallback);
                    if failures >= self.failures_to_fallback {
                        self.in_fallback.store(true, Ordering::SeqCst);
                    }
                }
            }
        }

        if self.backups.is_empty() {
            return Err(ConnectError::NoBackups);
        }
        if self.eager_retry
            && let Ok(connection) = self.primary.connect()
        {
            return Ok(connection);
        }
        self.backups
            .iter()
            .find_map(|backup| backup.connect().ok())
            .ok_or(ConnectError::Exhausted)
    }
}

impl ObjectFactory for FailoverFactory {
    type Object = Connection;

    fn produce_object(&self, _pool: &GenericPool<Self>) -> FactoryResult<PoolObject<Connection>> {
        Ok(PoolObject::new(self.connect()?))
    }

    fn destroy_object(&self, object: &PoolObject<Connection>) -> FactoryResult<()> {
        let connection = object.object();
        connection.rollback();
        connection.close();
        Ok(())
    }

    fn validate_object(&self, object: &PoolObject<Connection>) -> FactoryResult<bool> {
        Ok(object.object().is_open())
    }

    fn sleep_object(&self, object: &PoolObject<Connection>) -> FactoryResult<()> {
        match self.strategy {
            ReturnStrategy::Commit => object.object().commit(),
            ReturnStrategy::Rollback => object.object().rollback(),
            ReturnStrategy::None => {}
        }
        Ok(())
    }
}

fn config() -> PoolConfiguration {
    PoolConfiguration::builder()
        .with_initial_pool_size(2)
        .with_max_pool_size(4)
        .with_max_pool_idle_size(2)
        .with_min_pool_idle_size(1)
        .with_max_wait(Duration::from_secs(1))
        .with_event_sink(TracingEventSink)
        .build()
}

fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    println!("=== simple_objectpool - Failover Example ===\n");

    healthy_primary();
    primary_down();
    eager_retry();
    no_backups();
}

fn healthy_primary() {
    println!("1. Healthy primary, commit on return:");
    let factory = FailoverFactory::new(Endpoint::new("primary", true), vec![Endpoint::new("backup-1", true)])
        .with_strategy(ReturnStrategy::Commit);
    let pool = GenericPool::new(factory, config());

    let connection = pool.borrow_object().unwrap();
    connection.execute("INSERT INTO audit VALUES (1)");
    pool.return_object(&connection).unwrap();

    println!("   Connected to: {}", connection.endpoint);
    println!("   Committed statements: {}", connection.committed.load(Ordering::SeqCst));
    println!("   In fallback: {}\n", pool.factory().in_fallback());
}

fn primary_down() {
    println!("2. Primary down, ranked backups:");
    let factory = FailoverFactory::new(
        Endpoint::new("primary", false),
        vec![Endpoint::new("backup-1", false), Endpoint::new("backup-2", true)],
    );
    let pool = GenericPool::new(factory, config());

    let connection = pool.get_object().unwrap();
    connection.execute("UPDATE accounts SET balance = 0");
    println!("   Connected to: {}", connection.endpoint);
    println!("   In fallback: {}", pool.factory().in_fallback());
    drop(connection);
    println!("   Idle connections: {}\n", pool.num_idle());
}

fn eager_retry() {
    println!("3. Eager retry returns to a recovered primary:");
    let factory = FailoverFactory::new(Endpoint::new("primary", false), vec![Endpoint::new("backup-1", true)])
        .with_eager_retry(true)
        .with_strategy(ReturnStrategy::None);
    let pool = GenericPool::new(factory, config());

    let before = pool.borrow_object().unwrap();
    println!("   Before recovery: {}", before.endpoint);

    pool.factory().primary.up.store(true, Ordering::SeqCst);
    pool.clear().unwrap();

    let after = pool.borrow_object().unwrap();
    println!("   After recovery: {}", after.endpoint);

    pool.return_object(&before).unwrap();
    pool.return_object(&after).unwrap();
    pool.close();
    println!();
}

fn no_backups() {
    println!("4. Primary down without backups:");
    let factory = FailoverFactory::new(Endpoint::new("primary", false), Vec::new());
    let pool = GenericPool::new(factory, config());

    println!("   Idle after create: {}", pool.num_idle());
    match pool.borrow_object_with_timeout(Some(Duration::from_millis(100))) {
        Ok(connection) => println!("   Unexpected connection to {}", connection.endpoint),
        Err(e) => println!("   Borrow failed: {e}"),
    }
}
