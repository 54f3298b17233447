//! Metrics collection and export for object pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time metrics of a pool
///
/// # Examples
///
/// ```
/// use simple_objectpool::{FactoryResult, GenericPool, ObjectFactory, PoolConfiguration, PoolObject};
///
/// struct Numbers;
///
/// impl ObjectFactory for Numbers {
///     type Object = u32;
///
///     fn produce_object(&self, _pool: &GenericPool<Self>) -> FactoryResult<PoolObject<u32>> {
///         Ok(PoolObject::new(0))
///     }
/// }
///
/// let config = PoolConfiguration::builder().with_initial_pool_size(3).build();
/// let pool = GenericPool::new(Numbers, config);
///
/// let object = pool.borrow_object().unwrap();
/// let metrics = pool.metrics();
/// assert_eq!(metrics.total_borrowed, 1);
/// assert_eq!(metrics.active_objects, 1);
/// assert_eq!(metrics.created_objects, 3);
/// # pool.return_object(&object).unwrap();
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Objects currently borrowed
    pub active_objects: usize,

    /// Objects currently idle
    pub idle_objects: usize,

    /// Objects ever produced by the factory
    pub created_objects: u64,

    /// Objects ever destroyed
    pub destroyed_objects: u64,

    /// Successful borrows
    pub total_borrowed: u64,

    /// Successful returns
    pub total_returned: u64,

    pub validation_failures: u64,

    pub activation_failures: u64,

    /// Pool utilization ratio (0.0 to 1.0)
    pub utilization: f64,

    pub max_pool_size: usize,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("active_objects".to_string(), self.active_objects.to_string());
        metrics.insert("idle_objects".to_string(), self.idle_objects.to_string());
        metrics.insert("created_objects".to_string(), self.created_objects.to_string());
        metrics.insert("destroyed_objects".to_string(), self.destroyed_objects.to_string());
        metrics.insert("total_borrowed".to_string(), self.total_borrowed.to_string());
        metrics.insert("total_returned".to_string(), self.total_returned.to_string());
        metrics.insert("validation_failures".to_string(), self.validation_failures.to_string());
        metrics.insert("activation_failures".to_string(), self.activation_failures.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics.insert("max_pool_size".to_string(), self.max_pool_size.to_string());
        metrics
    }
}

/// Metrics exporter for Prometheus format
#[cfg(feature = "metrics")]
pub struct MetricsExporter;

#[cfg(feature = "metrics")]
impl MetricsExporter {
    /// Render metrics in the Prometheus text exposition format.
    ///
    /// Every sample carries a `pool` label plus any extra `tags`.
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> prometheus::Result<String> {
        use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};

        let mut labels = HashMap::new();
        labels.insert("pool".to_string(), pool_name.to_string());
        if let Some(tags) = tags {
            labels.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        let registry = Registry::new_custom(None, Some(labels))?;

        let gauge = |name: &str, help: &str, value: usize| -> prometheus::Result<()> {
            let gauge = IntGauge::new(name, help)?;
            gauge.set(i64::try_from(value).unwrap_or(i64::MAX));
            registry.register(Box::new(gauge))
        };
        let counter = |name: &str, help: &str, value: u64| -> prometheus::Result<()> {
            let counter = IntCounter::new(name, help)?;
            counter.inc_by(value);
            registry.register(Box::new(counter))
        };

        gauge("objectpool_objects_active", "Current active objects", metrics.active_objects)?;
        gauge("objectpool_objects_idle", "Current idle objects", metrics.idle_objects)?;
        gauge("objectpool_max_pool_size", "Maximum objects the pool may hold", metrics.max_pool_size)?;

        let utilization = Gauge::new("objectpool_utilization", "Pool utilization ratio")?;
        utilization.set(metrics.utilization);
        registry.register(Box::new(utilization))?;

        counter("objectpool_objects_created_total", "Objects created", metrics.created_objects)?;
        counter("objectpool_objects_destroyed_total", "Objects destroyed", metrics.destroyed_objects)?;
        counter("objectpool_objects_borrowed_total", "Objects borrowed", metrics.total_borrowed)?;
        counter("objectpool_objects_returned_total", "Objects returned", metrics.total_returned)?;
        counter("objectpool_validation_failures_total", "Validation failures", metrics.validation_failures)?;
        counter("objectpool_activation_failures_total", "Activation failures", metrics.activation_failures)?;

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Internal metrics tracker. Counters only ever grow.
#[derive(Default)]
pub(crate) struct MetricsTracker {
    pub created: AtomicU64,
    pub destroyed: AtomicU64,
    pub borrowed: AtomicU64,
    pub returned: AtomicU64,
    pub validation_failures: AtomicU64,
    pub activation_failures: AtomicU64,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    pub fn get_metrics(&self, active: usize, idle: usize, max_pool_size: usize) -> PoolMetrics {
        let utilization = if max_pool_size > 0 {
            active as f64 / max_pool_size as f64
        } else {
            0.0
        };

        PoolMetrics {
            active_objects: active,
            idle_objects: idle,
            created_objects: Self::read(&self.created),
            destroyed_objects: Self::read(&self.destroyed),
            total_borrowed: Self::read(&self.borrowed),
            total_returned: Self::read(&self.returned),
            validation_failures: Self::read(&self.validation_failures),
            activation_failures: Self::read(&self.activation_failures),
            utilization,
            max_pool_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PoolMetrics {
        let tracker = MetricsTracker::new();
        MetricsTracker::increment(&tracker.created);
        MetricsTracker::increment(&tracker.created);
        MetricsTracker::increment(&tracker.borrowed);
        tracker.get_metrics(1, 1, 4)
    }

    #[test]
    fn test_snapshot() {
        let metrics = sample();
        assert_eq!(metrics.created_objects, 2);
        assert_eq!(metrics.total_borrowed, 1);
        assert_eq!(metrics.destroyed_objects, 0);
        assert!((metrics.utilization - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_capacity_utilization() {
        let metrics = MetricsTracker::new().get_metrics(0, 0, 0);
        assert_eq!(metrics.utilization, 0.0);
    }

    #[test]
    fn test_export_map() {
        let exported = sample().export();
        assert_eq!(exported["created_objects"], "2");
        assert_eq!(exported["utilization"], "0.25");
        assert_eq!(exported.len(), 10);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_prometheus_export() {
        let mut tags = HashMap::new();
        tags.insert("service".to_string(), "api".to_string());

        let output = MetricsExporter::export_prometheus(&sample(), "main", Some(&tags)).unwrap();
        assert!(output.contains("# TYPE objectpool_objects_active gauge"));
        assert!(output.contains("objectpool_objects_created_total"));
        assert!(output.contains("pool=\"main\""));
        assert!(output.contains("service=\"api\""));
    }
}
