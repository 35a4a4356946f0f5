//! RAII guards that hand items back to their pool when dropped

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::pool::ResourcePool;
use crate::self_cleaning::SelfCleaningPool;

/// An item borrowed from a [`ResourcePool`], checked back in on drop.
///
/// # Examples
///
/// ```
/// use resourcepool::{PoolConfiguration, ResourcePool};
///
/// let pool = ResourcePool::new(PoolConfiguration::new().with_capacity(1), String::new).unwrap();
/// {
///     let mut line = pool.lease().unwrap();
///     line.push_str("hello");
///     assert_eq!(pool.available_permits(), 0);
/// }
/// assert_eq!(pool.available_permits(), 1);
/// assert_eq!(pool.check_out().unwrap(), "hello");
/// ```
pub struct Lease<'a, T> {
    pool: &'a ResourcePool<T>,
    item: Option<T>,
}

impl<'a, T> Lease<'a, T> {
    pub(crate) fn new(pool: &'a ResourcePool<T>, item: T) -> Self {
        Self {
            pool,
            item: Some(item),
        }
    }

    /// Drop a broken item instead of returning it. The disposer runs on it
    /// and the permit is freed so a replacement can be built.
    pub fn discard(mut self) {
        if let Some(item) = self.item.take() {
            self.pool.dispose(item);
        }
        self.pool.discard();
    }
}

impl<T> Deref for Lease<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // Only `discard` and `drop` take the item, and both consume the lease.
        self.item.as_ref().expect("Value already taken")
    }
}

impl<T> DerefMut for Lease<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.item.as_mut().expect("Value already taken")
    }
}

impl<T> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.check_in(item);
        }
    }
}

/// An item borrowed from a [`SelfCleaningPool`], checked back in on drop.
pub struct CleaningLease<'a, T> {
    pool: &'a SelfCleaningPool<T>,
    item: Option<Arc<T>>,
}

impl<'a, T> CleaningLease<'a, T> {
    pub(crate) fn new(pool: &'a SelfCleaningPool<T>, item: Arc<T>) -> Self {
        Self {
            pool,
            item: Some(item),
        }
    }

    /// Shared handle to the leased item, for identity checks.
    pub fn item(&self) -> &Arc<T> {
        self.item.as_ref().expect("Value already taken")
    }
}

impl<T> Deref for CleaningLease<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.item()
    }
}

impl<T> Drop for CleaningLease<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            if let Err(err) = self.pool.check_in(item) {
                tracing::debug!(%err, "lease returned to a pool that no longer tracks it");
            }
        }
    }
}
