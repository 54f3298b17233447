//! Pool configuration options

use crate::event::{EventSink, NoopEventSink};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Immutable configuration for a [`GenericPool`](crate::GenericPool).
///
/// Built through [`PoolConfigurationBuilder`], which applies the sizing
/// floors once in [`build`](PoolConfigurationBuilder::build): neither the
/// pool size cap nor the idle cap can fall below the initial size.
///
/// # Examples
///
/// ```
/// use simple_objectpool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::builder()
///     .with_initial_pool_size(5)
///     .with_max_pool_size(3)
///     .with_max_wait(Duration::from_secs(2))
///     .with_lifo(true)
///     .build();
///
/// assert_eq!(config.max_pool_size(), 5);
/// assert_eq!(config.max_pool_idle_size(), 5);
/// assert_eq!(config.max_wait(), Some(Duration::from_secs(2)));
/// assert!(config.prefers_lifo());
/// ```
#[derive(Clone)]
pub struct PoolConfiguration {
    initial_pool_size: usize,
    max_pool_size: usize,
    max_pool_idle_size: usize,
    min_pool_idle_size: usize,
    max_wait: Option<Duration>,
    max_object_idle_time: Duration,
    prefers_lifo: bool,
    autostart: bool,
    event_sink: Arc<dyn EventSink>,
}

impl PoolConfiguration {
    pub fn builder() -> PoolConfigurationBuilder {
        PoolConfigurationBuilder::default()
    }

    /// Objects created by [`GenericPool::create`](crate::GenericPool::create)
    pub fn initial_pool_size(&self) -> usize {
        self.initial_pool_size
    }

    /// Cap on all objects known to the pool, idle or borrowed
    pub fn max_pool_size(&self) -> usize {
        self.max_pool_size
    }

    /// Cap on the idle queue length
    pub fn max_pool_idle_size(&self) -> usize {
        self.max_pool_idle_size
    }

    /// Idle floor restored after objects are destroyed
    pub fn min_pool_idle_size(&self) -> usize {
        self.min_pool_idle_size
    }

    /// How long a borrow waits for an idle object; `None` waits indefinitely
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait
    }

    /// Carried for factories and callers that care; the pool itself never
    /// expires idle objects by age.
    pub fn max_object_idle_time(&self) -> Duration {
        self.max_object_idle_time
    }

    pub fn prefers_lifo(&self) -> bool {
        self.prefers_lifo
    }

    pub fn autostart(&self) -> bool {
        self.autostart
    }

    pub fn event_sink(&self) -> &Arc<dyn EventSink> {
        &self.event_sink
    }
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        PoolConfigurationBuilder::default().build()
    }
}

impl fmt::Debug for PoolConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConfiguration")
            .field("initial_pool_size", &self.initial_pool_size)
            .field("max_pool_size", &self.max_pool_size)
            .field("max_pool_idle_size", &self.max_pool_idle_size)
            .field("min_pool_idle_size", &self.min_pool_idle_size)
            .field("max_wait", &self.max_wait)
            .field("max_object_idle_time", &self.max_object_idle_time)
            .field("prefers_lifo", &self.prefers_lifo)
            .field("autostart", &self.autostart)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PoolConfiguration`]
#[derive(Clone)]
pub struct PoolConfigurationBuilder {
    initial_pool_size: usize,
    max_pool_size: usize,
    max_pool_idle_size: usize,
    min_pool_idle_size: usize,
    max_wait: Option<Duration>,
    max_object_idle_time: Duration,
    prefers_lifo: bool,
    autostart: bool,
    event_sink: Arc<dyn EventSink>,
}

impl Default for PoolConfigurationBuilder {
    fn default() -> Self {
        Self {
            initial_pool_size: 1,
            max_pool_size: 1,
            max_pool_idle_size: 1,
            min_pool_idle_size: 1,
            max_wait: Some(Duration::from_secs(10)),
            max_object_idle_time: Duration::from_secs(100),
            prefers_lifo: false,
            autostart: true,
            event_sink: Arc::new(NoopEventSink),
        }
    }
}

impl PoolConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_pool_size(mut self, size: usize) -> Self {
        self.initial_pool_size = size;
        self
    }

    pub fn with_max_pool_size(mut self, size: usize) -> Self {
        self.max_pool_size = size;
        self
    }

    pub fn with_max_pool_idle_size(mut self, size: usize) -> Self {
        self.max_pool_idle_size = size;
        self
    }

    pub fn with_min_pool_idle_size(mut self, size: usize) -> Self {
        self.min_pool_idle_size = size;
        self
    }

    /// Bound how long a borrow waits for an idle object
    pub fn with_max_wait(mut self, timeout: Duration) -> Self {
        self.max_wait = Some(timeout);
        self
    }

    /// Let borrows wait for an idle object indefinitely
    pub fn with_unbounded_wait(mut self) -> Self {
        self.max_wait = None;
        self
    }

    /// Whole-second variant of [`with_max_wait`](Self::with_max_wait);
    /// negative values mean wait indefinitely.
    ///
    /// ```
    /// use simple_objectpool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::builder().with_max_wait_in_sec(-1).build();
    /// assert_eq!(config.max_wait(), None);
    /// ```
    pub fn with_max_wait_in_sec(mut self, seconds: i64) -> Self {
        self.max_wait = u64::try_from(seconds).ok().map(Duration::from_secs);
        self
    }

    pub fn with_max_object_idle_time(mut self, idle_time: Duration) -> Self {
        self.max_object_idle_time = idle_time;
        self
    }

    /// Hand out the most recently returned object first
    pub fn with_lifo(mut self, prefers_lifo: bool) -> Self {
        self.prefers_lifo = prefers_lifo;
        self
    }

    /// Populate the pool while constructing it
    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }

    pub fn with_event_sink<S: EventSink + 'static>(mut self, sink: S) -> Self {
        self.event_sink = Arc::new(sink);
        self
    }

    /// Share one sink between several pools
    pub fn with_shared_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    pub fn build(self) -> PoolConfiguration {
        PoolConfiguration {
            initial_pool_size: self.initial_pool_size,
            max_pool_size: self.max_pool_size.max(self.initial_pool_size),
            max_pool_idle_size: self.max_pool_idle_size.max(self.initial_pool_size),
            min_pool_idle_size: self.min_pool_idle_size,
            max_wait: self.max_wait,
            max_object_idle_time: self.max_object_idle_time,
            prefers_lifo: self.prefers_lifo,
            autostart: self.autostart,
            event_sink: self.event_sink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfiguration::default();
        assert_eq!(config.initial_pool_size(), 1);
        assert_eq!(config.max_pool_size(), 1);
        assert_eq!(config.max_pool_idle_size(), 1);
        assert_eq!(config.min_pool_idle_size(), 1);
        assert_eq!(config.max_wait(), Some(Duration::from_secs(10)));
        assert_eq!(config.max_object_idle_time(), Duration::from_secs(100));
        assert!(!config.prefers_lifo());
        assert!(config.autostart());
    }

    #[test]
    fn test_caps_clamped_to_initial_size() {
        let config = PoolConfiguration::builder()
            .with_initial_pool_size(8)
            .with_max_pool_size(2)
            .with_max_pool_idle_size(4)
            .build();

        assert_eq!(config.max_pool_size(), 8);
        assert_eq!(config.max_pool_idle_size(), 8);
    }

    #[test]
    fn test_larger_caps_kept() {
        let config = PoolConfiguration::builder()
            .with_initial_pool_size(2)
            .with_max_pool_size(10)
            .with_max_pool_idle_size(6)
            .with_min_pool_idle_size(3)
            .build();

        assert_eq!(config.max_pool_size(), 10);
        assert_eq!(config.max_pool_idle_size(), 6);
        assert_eq!(config.min_pool_idle_size(), 3);
    }

    #[test]
    fn test_wait_settings() {
        let config = PoolConfiguration::builder().with_unbounded_wait().build();
        assert_eq!(config.max_wait(), None);

        let config = PoolConfiguration::builder().with_max_wait_in_sec(3).build();
        assert_eq!(config.max_wait(), Some(Duration::from_secs(3)));

        let config = PoolConfiguration::builder().with_max_wait_in_sec(0).build();
        assert_eq!(config.max_wait(), Some(Duration::ZERO));
    }
}
