//! Error types for the object pool

use crate::object::ObjectState;
use std::time::Duration;
use thiserror::Error;

/// Error produced by an [`ObjectFactory`](crate::ObjectFactory) operation.
pub type FactoryError = Box<dyn std::error::Error + Send + Sync>;

/// Result of an [`ObjectFactory`](crate::ObjectFactory) operation.
pub type FactoryResult<T> = Result<T, FactoryError>;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Pool is closed")]
    PoolClosed,

    #[error("Returned object was not created by this pool")]
    UnknownResource,

    #[error("Object has already been returned to the pool")]
    DoubleReturn,

    #[error("Object cannot be allocated from state {0:?}")]
    IllegalState(ObjectState),

    #[error("Timed out after {0:?} waiting for an idle object")]
    Timeout(Duration),

    #[error("No object available - the pool stopped handing out objects")]
    NoObjectAvailable,

    #[error("Unable to validate object")]
    ValidationFailed {
        /// `None` when the factory reported the object as invalid rather than failing
        #[source]
        source: Option<FactoryError>,
    },

    #[error("Unable to activate object")]
    ActivationFailed {
        #[source]
        source: FactoryError,
    },

    #[error("Failed to recreate the minimum number of idle objects; the pool was closed")]
    RecreationFailure {
        #[source]
        source: Box<PoolError>,
    },

    #[error("Operation was cancelled")]
    Cancelled,
}

impl PoolError {
    /// Whether the caller may reasonably retry the same operation later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::ValidationFailed { .. } | Self::ActivationFailed { .. }
        )
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
