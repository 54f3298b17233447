//! Health checks derived from a pool's current state

use crate::metrics::PoolMetrics;
use std::fmt;

/// Utilization above which a pool counts as saturated
pub const SATURATION_THRESHOLD: f64 = 0.9;

/// A condition worth reporting about a pool
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HealthWarning {
    /// The pool has been closed and hands out nothing.
    Closed,
    /// Borrowed objects take up more than [`SATURATION_THRESHOLD`] of `max_pool_size`.
    Saturated { utilization: f64 },
    /// No idle object is ready; the next borrow creates or waits.
    NoIdleObjects,
    /// Fewer idle objects than `min_pool_idle_size`, usually because the
    /// factory is failing to produce replacements.
    BelowMinimumIdle { idle: usize, min_idle: usize },
}

impl HealthWarning {
    /// Whether this warning makes the pool unhealthy
    pub fn is_critical(&self) -> bool {
        matches!(self, HealthWarning::Closed | HealthWarning::Saturated { .. })
    }
}

impl fmt::Display for HealthWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthWarning::Closed => write!(f, "Pool is closed"),
            HealthWarning::Saturated { utilization } => {
                write!(f, "High utilization: {:.1}%", utilization * 100.0)
            }
            HealthWarning::NoIdleObjects => write!(f, "No idle objects"),
            HealthWarning::BelowMinimumIdle { idle, min_idle } => {
                write!(f, "Idle objects below minimum: {idle}/{min_idle}")
            }
        }
    }
}

/// Health of a pool at one point in time
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
/// let health = pool.health_status();
/// assert!(health.is_healthy());
/// assert_eq!(health.idle_objects, 3);
/// ```
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub utilization: f64,
    pub idle_objects: usize,
    pub active_objects: usize,
    pub max_pool_size: usize,
    pub is_closed: bool,
    pub warnings: Vec<HealthWarning>,
}

impl HealthStatus {
    pub(crate) fn evaluate(metrics: &PoolMetrics, min_idle: usize, is_closed: bool) -> Self {
        let mut warnings = Vec::new();

        if is_closed {
            warnings.push(HealthWarning::Closed);
        } else {
            if metrics.utilization > SATURATION_THRESHOLD {
                warnings.push(HealthWarning::Saturated {
                    utilization: metrics.utilization,
                });
            }
            if metrics.idle_objects == 0 {
                warnings.push(HealthWarning::NoIdleObjects);
            } else if metrics.idle_objects < min_idle {
                warnings.push(HealthWarning::BelowMinimumIdle {
                    idle: metrics.idle_objects,
                    min_idle,
                });
            }
        }

        Self {
            utilization: metrics.utilization,
            idle_objects: metrics.idle_objects,
            active_objects: metrics.active_objects,
            max_pool_size: metrics.max_pool_size,
            is_closed,
            warnings,
        }
    }

    /// No critical warnings. An empty idle queue alone keeps the pool healthy.
    pub fn is_healthy(&self) -> bool {
        !self.warnings.iter().any(HealthWarning::is_critical)
    }
}
