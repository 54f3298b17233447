//! Pooled object handles and their lifecycle state machine

use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Lifecycle state of a [`PoolObject`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectState {
    /// Sitting in the idle queue (or freshly produced)
    Idle,

    /// Handed out to a caller
    Allocated,

    /// Given back by the caller, not yet recycled
    Returned,

    /// About to be destroyed; terminal
    Invalid,
}

/// Identity of a pooled resource.
///
/// Derived from the address of the resource's `Arc` allocation, so it never
/// consults the resource's own `PartialEq` or `Hash`. The address stays
/// reserved for as long as the pool's registry holds the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    pub(crate) fn of<T>(object: &Arc<T>) -> Self {
        Self(Arc::as_ptr(object) as *const () as usize)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Wraps one managed resource together with its pooling state.
///
/// Produced by [`ObjectFactory::produce_object`](crate::ObjectFactory::produce_object)
/// and destroyed by the same factory. Every transition locks only this handle.
///
/// # Examples
///
/// ```
/// use simple_objectpool::{ObjectState, PoolObject};
///
/// let object = PoolObject::new("connection");
/// assert_eq!(object.state(), ObjectState::Idle);
/// assert_eq!(**object.object(), "connection");
/// ```
pub struct PoolObject<T> {
    object: Arc<T>,
    state: Mutex<ObjectState>,
    created_at: Instant,
    return_lock: Mutex<()>,
}

impl<T> PoolObject<T> {
    pub fn new(object: T) -> Self {
        Self {
            object: Arc::new(object),
            state: Mutex::new(ObjectState::Idle),
            created_at: Instant::now(),
            return_lock: Mutex::new(()),
        }
    }

    /// The wrapped resource
    pub fn object(&self) -> &Arc<T> {
        &self.object
    }

    pub fn id(&self) -> ObjectId {
        ObjectId::of(&self.object)
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Time since the handle was produced
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn state(&self) -> ObjectState {
        *self.state.lock()
    }

    /// Idle -> Allocated
    pub(crate) fn allocate(&self) -> bool {
        let mut state = self.state.lock();
        if *state == ObjectState::Idle {
            *state = ObjectState::Allocated;
            return true;
        }
        false
    }

    /// Allocated -> Returned; `false` flags a double return
    pub(crate) fn mark_returned(&self) -> bool {
        let mut state = self.state.lock();
        if *state == ObjectState::Allocated {
            *state = ObjectState::Returned;
            return true;
        }
        false
    }

    /// Returned | Allocated -> Idle
    pub(crate) fn deallocate(&self) -> bool {
        let mut state = self.state.lock();
        if matches!(*state, ObjectState::Returned | ObjectState::Allocated) {
            *state = ObjectState::Idle;
            return true;
        }
        false
    }

    pub(crate) fn invalidate(&self) {
        *self.state.lock() = ObjectState::Invalid;
    }

    /// Serializes returns of this resource across threads.
    pub(crate) fn lock_for_return(&self) -> MutexGuard<'_, ()> {
        self.return_lock.lock()
    }
}

impl<T> fmt::Debug for PoolObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolObject")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("age", &self.age())
            .finish()
    }
}
