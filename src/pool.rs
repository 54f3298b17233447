//! Core pool engine

use crate::config::PoolConfiguration;
use crate::errors::{FactoryResult, PoolError, PoolResult};
use crate::event::Severity;
use crate::factory::ObjectFactory;
use crate::health::HealthStatus;
use crate::idle_queue::IdleQueue;
use crate::metrics::{MetricsTracker, PoolMetrics};
use crate::object::{ObjectId, PoolObject};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

type Handle<T> = Arc<PoolObject<T>>;

/// Thread-safe blocking pool of factory-made objects.
///
/// Objects are handed out as `Arc<F::Object>` and must be given back with
/// [`return_object`](Self::return_object), or borrowed through
/// [`get_object`](Self::get_object) which returns them on drop. The pool
/// tracks every object by the identity of that `Arc`, never by value.
///
/// # Examples
///
/// ```
/// use simple_objectpool::{FactoryResult, GenericPool, ObjectFactory, PoolConfiguration, PoolObject};
///
/// struct Buffers;
///
/// impl ObjectFactory for Buffers {
///     type Object = Vec<u8>;
///
///     fn produce_object(&self, _pool: &GenericPool<Self>) -> FactoryResult<PoolObject<Vec<u8>>> {
///         Ok(PoolObject::new(Vec::with_capacity(4096)))
///     }
/// }
///
/// let config = PoolConfiguration::builder().with_initial_pool_size(5).build();
/// let pool = GenericPool::new(Buffers, config);
/// assert_eq!(pool.num_idle(), 5);
///
/// let buffer = pool.borrow_object().unwrap();
/// assert_eq!(pool.num_active(), 1);
///
/// pool.return_object(&buffer).unwrap();
/// assert_eq!(pool.num_idle(), 5);
/// ```
pub struct GenericPool<F: ObjectFactory> {
    prepared: AtomicBool,
    objects: DashMap<ObjectId, Handle<F::Object>>,
    /// Replaced on reopen; a closed queue stays cancelled.
    idle: RwLock<Arc<IdleQueue<Handle<F::Object>>>>,
    creation_lock: Mutex<()>,
    metrics: MetricsTracker,
    config: PoolConfiguration,
    factory: F,
}

impl<F: ObjectFactory> GenericPool<F> {
    /// Create a pool. With `autostart` set the pool is populated right away,
    /// otherwise it stays closed until [`create`](Self::create) is called.
    pub fn new(factory: F, config: PoolConfiguration) -> Self {
        let pool = Self {
            prepared: AtomicBool::new(false),
            objects: DashMap::new(),
            idle: RwLock::new(Arc::new(IdleQueue::new())),
            creation_lock: Mutex::new(()),
            metrics: MetricsTracker::new(),
            config,
            factory,
        };
        if pool.config.autostart() {
            pool.create();
        }
        pool
    }

    pub fn config(&self) -> &PoolConfiguration {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Objects currently borrowed
    pub fn num_active(&self) -> usize {
        self.objects.len().saturating_sub(self.num_idle())
    }

    pub fn num_idle(&self) -> usize {
        self.idle_queue().len()
    }

    pub fn num_created(&self) -> u64 {
        MetricsTracker::read(&self.metrics.created)
    }

    pub fn num_destroyed(&self) -> u64 {
        MetricsTracker::read(&self.metrics.destroyed)
    }

    pub fn is_closed(&self) -> bool {
        !self.prepared.load(Ordering::Acquire)
    }

    /// Open the pool and produce the initial objects.
    ///
    /// Only the first call on a closed pool does anything. The prefill
    /// ignores `max_pool_size`; failures are reported to the event sink and
    /// the remaining objects are still produced.
    pub fn create(&self) {
        let idle = {
            let mut current = self.idle.write();
            if self
                .prepared
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }
            if current.is_cancelled() {
                *current = Arc::new(IdleQueue::new());
            }
            Arc::clone(&*current)
        };

        {
            let _creation = self.creation_lock.lock();
            for _ in 0..self.config.initial_pool_size() {
                let object = match self.factory.produce_object(self) {
                    Ok(object) => Arc::new(object),
                    Err(e) => {
                        self.new_event(Severity::Error, format_args!("Error while producing object: {e}"));
                        continue;
                    }
                };
                MetricsTracker::increment(&self.metrics.created);

                match self.factory.validate_object(&object) {
                    Ok(true) => {
                        self.objects.insert(object.id(), Arc::clone(&object));
                        self.push_idle(&idle, object);
                    }
                    Ok(false) => {
                        MetricsTracker::increment(&self.metrics.validation_failures);
                        self.new_event(
                            Severity::Warn,
                            format_args!("Object {} failed validation and was not pooled.", object.id()),
                        );
                        self.destroy_quietly(&object);
                    }
                    Err(e) => {
                        MetricsTracker::increment(&self.metrics.validation_failures);
                        self.new_event(
                            Severity::Error,
                            format_args!("Error while validating object {}: {e}", object.id()),
                        );
                        self.destroy_quietly(&object);
                    }
                }
            }
        }

        // Closed while prefilling
        self.drain_if_cancelled(&idle);
        self.new_event(
            Severity::Debug,
            format_args!("Pool created with {} idle objects.", self.num_idle()),
        );
    }

    /// Borrow an object, waiting up to the configured `max_wait`.
    pub fn borrow_object(&self) -> PoolResult<Arc<F::Object>> {
        self.borrow_object_with_timeout(self.config.max_wait())
    }

    /// Borrow an object, waiting up to `max_wait` (`None` waits indefinitely)
    /// when the pool is exhausted.
    ///
    /// Idle objects that fail validation or activation are destroyed and the
    /// borrow moves on to the next one. Only a failure of an object created
    /// for this very call is reported to the caller.
    pub fn borrow_object_with_timeout(&self, max_wait: Option<Duration>) -> PoolResult<Arc<F::Object>> {
        if self.is_closed() {
            return Err(PoolError::PoolClosed);
        }

        loop {
            let (object, created) = self.next_candidate(max_wait)?;

            match self.factory.validate_object(&object) {
                Ok(true) => {}
                Ok(false) => {
                    MetricsTracker::increment(&self.metrics.validation_failures);
                    self.new_event(
                        Severity::Warn,
                        format_args!("Object {} is no longer valid and was destroyed.", object.id()),
                    );
                    self.discard(&object);
                    if created {
                        return Err(PoolError::ValidationFailed { source: None });
                    }
                    continue;
                }
                Err(e) => {
                    MetricsTracker::increment(&self.metrics.validation_failures);
                    self.new_event(
                        Severity::Warn,
                        format_args!("Object {} could not be validated and was destroyed: {e}", object.id()),
                    );
                    self.discard(&object);
                    if created {
                        return Err(PoolError::ValidationFailed { source: Some(e) });
                    }
                    continue;
                }
            }

            if !object.allocate() {
                let state = object.state();
                self.discard(&object);
                return Err(PoolError::IllegalState(state));
            }

            if let Err(e) = self.factory.activate_object(&object) {
                MetricsTracker::increment(&self.metrics.activation_failures);
                self.discard(&object);
                if created {
                    return Err(PoolError::ActivationFailed { source: e });
                }
                self.new_event(
                    Severity::Warn,
                    format_args!("Object {} could not be activated and was destroyed: {e}", object.id()),
                );
                continue;
            }

            MetricsTracker::increment(&self.metrics.borrowed);
            self.new_event(Severity::Info, format_args!("Object {} borrowed from the pool.", object.id()));
            return Ok(Arc::clone(object.object()));
        }
    }

    /// Borrow an object wrapped in a guard that returns it on drop.
    pub fn get_object(&self) -> PoolResult<PooledObject<'_, F>> {
        let object = self.borrow_object()?;
        Ok(PooledObject {
            object: Some(object),
            pool: self,
        })
    }

    /// Give a borrowed object back.
    ///
    /// Objects borrowed before [`close`](Self::close) may still be returned
    /// afterwards; they are destroyed instead of recycled. A failure to put
    /// the object to sleep destroys it without failing the call.
    pub fn return_object(&self, object: &Arc<F::Object>) -> PoolResult<()> {
        let handle = self
            .objects
            .get(&ObjectId::of(object))
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(PoolError::UnknownResource)?;

        let _returning = handle.lock_for_return();
        if !handle.mark_returned() {
            return Err(PoolError::DoubleReturn);
        }

        if let Err(e) = self.factory.sleep_object(&handle) {
            self.new_event(
                Severity::Error,
                format_args!("Error while putting object {} to sleep: {e}", handle.id()),
            );
            self.discard(&handle);
            return Ok(());
        }

        if !handle.deallocate() {
            return Err(PoolError::DoubleReturn);
        }
        MetricsTracker::increment(&self.metrics.returned);

        let idle = self.idle_queue();
        if self.is_closed() {
            self.discard(&handle);
            return Ok(());
        }

        match self.push_idle_bounded(&idle, Arc::clone(&handle)) {
            Ok(()) => {
                self.new_event(
                    Severity::Info,
                    format_args!("Object {} returned back to the idle objects.", handle.id()),
                );
                // Closed between the check above and the push
                self.drain_if_cancelled(&idle);
            }
            Err(_) => self.discard(&handle),
        }
        Ok(())
    }

    /// Destroy every idle object and recreate the configured minimum.
    ///
    /// If the minimum cannot be recreated the pool is closed and
    /// [`PoolError::RecreationFailure`] is returned.
    pub fn clear(&self) -> PoolResult<()> {
        self.drain(&self.idle_queue());

        if let Err(e) = self.check_for_minimum_idles() {
            self.shut_down();
            self.new_event(
                Severity::Error,
                format_args!("Recreating idle objects failed, pool closed: {e}"),
            );
            return Err(PoolError::RecreationFailure { source: Box::new(e) });
        }
        Ok(())
    }

    /// Close the pool: destroy the idle objects and wake blocked borrowers.
    ///
    /// Borrowed objects stay valid until they are returned.
    pub fn close(&self) {
        if self.shut_down() {
            self.new_event(Severity::Debug, format_args!("Pool closed."));
        }
    }

    fn shut_down(&self) -> bool {
        let idle = {
            let current = self.idle.read();
            if self
                .prepared
                .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return false;
            }
            // Cancel before draining
            current.cancel();
            Arc::clone(&*current)
        };
        self.drain(&idle);
        true
    }

    pub fn metrics(&self) -> PoolMetrics {
        self.metrics
            .get_metrics(self.num_active(), self.num_idle(), self.config.max_pool_size())
    }

    pub fn health_status(&self) -> HealthStatus {
        HealthStatus::evaluate(&self.metrics(), self.config.min_pool_idle_size(), self.is_closed())
    }

    fn next_candidate(&self, max_wait: Option<Duration>) -> PoolResult<(Handle<F::Object>, bool)> {
        let idle = self.idle_queue();
        if let Some(object) = idle.pop() {
            return Ok((object, false));
        }
        if let Some(object) = self.create_one_object()? {
            return Ok((object, true));
        }

        let object = match max_wait {
            None => idle.take(),
            Some(timeout) => idle.take_timeout(timeout),
        };
        match (object, max_wait) {
            (Some(object), _) => Ok((object, false)),
            (None, _) if idle.is_cancelled() => Err(PoolError::NoObjectAvailable),
            (None, Some(timeout)) => Err(PoolError::Timeout(timeout)),
            (None, None) => Err(PoolError::NoObjectAvailable),
        }
    }

    /// Produce and register one object unless the pool is at `max_pool_size`.
    fn create_one_object(&self) -> PoolResult<Option<Handle<F::Object>>> {
        let _creation = self.creation_lock.lock();
        if self.is_closed() {
            return Err(PoolError::PoolClosed);
        }
        if self.objects.len() >= self.config.max_pool_size() {
            return Ok(None);
        }

        match self.factory.produce_object(self) {
            Ok(object) => {
                let object = Arc::new(object);
                MetricsTracker::increment(&self.metrics.created);
                self.objects.insert(object.id(), Arc::clone(&object));
                Ok(Some(object))
            }
            Err(e) => {
                self.new_event(Severity::Error, format_args!("Error while producing object: {e}"));
                Ok(None)
            }
        }
    }

    /// Top the idle queue up to `min_pool_idle_size`, stopping at `max_pool_size`.
    fn check_for_minimum_idles(&self) -> PoolResult<()> {
        if self.is_closed() {
            return Err(PoolError::PoolClosed);
        }

        let idle = self.idle_queue();
        let min_idle = self.config.min_pool_idle_size();
        let mut outcome = Ok(());
        while idle.len() < min_idle {
            match self.create_one_object() {
                Ok(Some(object)) => self.push_idle(&idle, object),
                Ok(None) => break,
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        // Closed during the backfill
        self.drain_if_cancelled(&idle);
        outcome
    }

    fn idle_queue(&self) -> Arc<IdleQueue<Handle<F::Object>>> {
        Arc::clone(&*self.idle.read())
    }

    fn drain(&self, idle: &IdleQueue<Handle<F::Object>>) {
        while let Some(object) = idle.pop() {
            self.destroy_quietly(&object);
        }
    }

    fn drain_if_cancelled(&self, idle: &IdleQueue<Handle<F::Object>>) {
        if idle.is_cancelled() {
            self.drain(idle);
        }
    }

    /// Destroy the object and restore the idle minimum, logging any failure.
    fn discard(&self, object: &Handle<F::Object>) {
        self.destroy_quietly(object);
        match self.check_for_minimum_idles() {
            Ok(()) => {}
            Err(PoolError::PoolClosed) => self.new_event(
                Severity::Debug,
                format_args!("Pool is closed, minimum idle objects not recreated."),
            ),
            Err(e) => self.new_event(
                Severity::Error,
                format_args!("Pool could not recreate minimum idle objects: {e}"),
            ),
        }
    }

    fn destroy_quietly(&self, object: &Handle<F::Object>) {
        if let Err(e) = self.destroy(object) {
            self.new_event(
                Severity::Warn,
                format_args!("Object {} could not be destroyed: {e}", object.id()),
            );
        }
    }

    fn destroy(&self, object: &Handle<F::Object>) -> FactoryResult<()> {
        object.invalidate();
        self.idle_queue().remove_if(|entry| Arc::ptr_eq(entry, object));
        self.objects.remove(&object.id());

        let result = self.factory.destroy_object(object);
        MetricsTracker::increment(&self.metrics.destroyed);
        self.new_event(Severity::Info, format_args!("Object {} was destroyed.", object.id()));
        result
    }

    fn push_idle(&self, idle: &IdleQueue<Handle<F::Object>>, object: Handle<F::Object>) {
        if self.config.prefers_lifo() {
            idle.push_front(object);
        } else {
            idle.push_back(object);
        }
    }

    fn push_idle_bounded(
        &self,
        idle: &IdleQueue<Handle<F::Object>>,
        object: Handle<F::Object>,
    ) -> Result<(), Handle<F::Object>> {
        let capacity = self.config.max_pool_idle_size();
        if self.config.prefers_lifo() {
            idle.push_front_bounded(object, capacity)
        } else {
            idle.push_back_bounded(object, capacity)
        }
    }

    fn new_event(&self, severity: Severity, message: fmt::Arguments<'_>) {
        self.config.event_sink().new_event(severity, message);
    }
}

impl<F: ObjectFactory + 'static> GenericPool<F> {
    /// Borrow from async code. The blocking borrow runs on tokio's blocking
    /// thread pool.
    pub async fn borrow_object_async(self: &Arc<Self>) -> PoolResult<Arc<F::Object>> {
        let pool = Arc::clone(self);
        tokio::task::spawn_blocking(move || pool.borrow_object())
            .await
            .map_err(|_| PoolError::Cancelled)?
    }
}

impl<F: ObjectFactory> fmt::Debug for GenericPool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericPool")
            .field("closed", &self.is_closed())
            .field("active", &self.num_active())
            .field("idle", &self.num_idle())
            .field("created", &self.num_created())
            .field("destroyed", &self.num_destroyed())
            .finish()
    }
}

/// A borrowed object that goes back to its pool when dropped
pub struct PooledObject<'a, F: ObjectFactory> {
    object: Option<Arc<F::Object>>,
    pool: &'a GenericPool<F>,
}

impl<F: ObjectFactory> PooledObject<'_, F> {
    /// Keep the object past the guard's lifetime. It counts as borrowed
    /// until handed to [`GenericPool::return_object`].
    pub fn detach(mut self) -> Arc<F::Object> {
        self.object.take().expect("Value already taken")
    }
}

impl<F: ObjectFactory> Deref for PooledObject<'_, F> {
    type Target = F::Object;

    fn deref(&self) -> &Self::Target {
        self.object.as_deref().expect("Value already taken")
    }
}

impl<F: ObjectFactory> Drop for PooledObject<'_, F> {
    fn drop(&mut self) {
        if let Some(object) = self.object.take()
            && let Err(e) = self.pool.return_object(&object)
        {
            self.pool.new_event(
                Severity::Error,
                format_args!("Object {} could not be returned: {e}", ObjectId::of(&object)),
            );
        }
    }
}
