//! Error types for the resource pool

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool is closed - no further checkouts are admitted")]
    Closed,

    #[error("Item was not produced by this pool")]
    UnrecognizedItem,

    #[error("Pool capacity must be greater than zero")]
    InvalidCapacity,

    #[error("Clean interval must be greater than zero")]
    InvalidInterval,

    #[error("Failed to start the cleaner thread: {0}")]
    CleanerSpawn(String),

    #[error("Checkout timed out after {0:?}")]
    Timeout(Duration),
}

pub type PoolResult<T> = Result<T, PoolError>;
