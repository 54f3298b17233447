//! The contract through which concrete resources plug into a pool

use crate::errors::FactoryResult;
use crate::object::PoolObject;
use crate::pool::GenericPool;

/// Creates, checks and disposes of the resources a [`GenericPool`] manages.
///
/// Everything resource-specific lives behind this trait: how a connection is
/// opened, which server it fails over to, what query proves it is alive.
/// The pool calls these hooks from whichever caller thread triggered them,
/// so any state the factory keeps must be thread-safe.
///
/// Resources are shared as `Arc<Self::Object>`; hooks that need to mutate
/// the resource rely on its interior mutability.
///
/// # Examples
///
/// ```
/// use simple_objectpool::{FactoryResult, GenericPool, ObjectFactory, PoolObject};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// struct Sessions {
///     next: AtomicUsize,
/// }
///
/// impl ObjectFactory for Sessions {
///     type Object = usize;
///
///     fn produce_object(&self, _pool: &GenericPool<Self>) -> FactoryResult<PoolObject<usize>> {
///         Ok(PoolObject::new(self.next.fetch_add(1, Ordering::Relaxed)))
///     }
/// }
/// ```
pub trait ObjectFactory: Send + Sync + Sized {
    /// The pooled resource type
    type Object: Send + Sync + 'static;

    /// Produce a new resource wrapped in an idle handle.
    fn produce_object(&self, pool: &GenericPool<Self>) -> FactoryResult<PoolObject<Self::Object>>;

    /// Release the resource. The handle may be in any state.
    fn destroy_object(&self, _object: &PoolObject<Self::Object>) -> FactoryResult<()> {
        Ok(())
    }

    /// Check the resource is usable.
    ///
    /// Return `Ok(false)` for ordinary unreachability and `Err` only for
    /// conditions the factory cannot recover from.
    fn validate_object(&self, _object: &PoolObject<Self::Object>) -> FactoryResult<bool> {
        Ok(true)
    }

    /// Prepare the resource right before it is handed to a caller.
    fn activate_object(&self, _object: &PoolObject<Self::Object>) -> FactoryResult<()> {
        Ok(())
    }

    /// Put the resource to sleep before it re-enters the idle set, releasing
    /// any per-use claim it holds.
    fn sleep_object(&self, _object: &PoolObject<Self::Object>) -> FactoryResult<()> {
        Ok(())
    }
}
