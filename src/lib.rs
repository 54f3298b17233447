//! # simple_objectpool
//!
//! Generic, thread-safe blocking object pool for expensive resources such as
//! database connections or sockets.
//!
//! ## Features
//!
//! - Pluggable [`ObjectFactory`] that produces, validates, activates, puts to
//!   sleep and destroys pooled objects
//! - Identity-based bookkeeping: objects are tracked by their `Arc`, never by
//!   their own equality
//! - LIFO or FIFO reuse, minimum idle backfill, idle and total caps
//! - Bounded or indefinite blocking borrows, woken by [`GenericPool::close`]
//! - Transparent recovery from idle objects that went bad
//! - RAII guard via [`GenericPool::get_object`] and async borrow via tokio
//! - Leveled diagnostics through an [`EventSink`], with a `tracing` adapter
//! - Metrics snapshot, Prometheus export and health status
//!
//! ## Quick Start
//!
//! ```rust
//! use simple_objectpool::{FactoryResult, GenericPool, ObjectFactory, PoolConfiguration, PoolObject};
//!
//! struct Greetings;
//!
//! impl ObjectFactory for Greetings {
//!     type Object = String;
//!
//!     fn produce_object(&self, _pool: &GenericPool<Self>) -> FactoryResult<PoolObject<String>> {
//!         Ok(PoolObject::new("hello".to_string()))
//!     }
//! }
//!
//! let pool = GenericPool::new(Greetings, PoolConfiguration::default());
//! {
//!     let greeting = pool.get_object().unwrap();
//!     println!("Got: {}", *greeting);
//!     // Object automatically returned when `greeting` goes out of scope
//! }
//! assert_eq!(pool.num_idle(), 1);
//! ```

mod config;
mod errors;
mod event;
mod factory;
mod health;
mod idle_queue;
mod metrics;
mod object;
mod pool;

pub use config::{PoolConfiguration, PoolConfigurationBuilder};
pub use errors::{FactoryError, FactoryResult, PoolError, PoolResult};
pub use event::{EventSink, NoopEventSink, Severity, TracingEventSink};
pub use factory::ObjectFactory;
pub use health::{HealthStatus, HealthWarning, SATURATION_THRESHOLD};
pub use idle_queue::IdleQueue;
#[cfg(feature = "metrics")]
pub use metrics::MetricsExporter;
pub use metrics::PoolMetrics;
pub use object::{ObjectId, ObjectState, PoolObject};
pub use pool::{GenericPool, PooledObject};
