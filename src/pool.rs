//! Basic bounded resource pool

use std::time::Duration;

use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::gate::{AdmissionGate, Permit};
use crate::lease::Lease;
use crate::store::ItemStack;

pub(crate) type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;
pub(crate) type Disposer<T> = Box<dyn Fn(T) + Send + Sync>;

/// Thread-safe pool that lends out at most `capacity` items at a time.
///
/// Items are built lazily by the factory and kept on a LIFO stack between
/// uses, so a recently returned item is the next one handed out.
///
/// # Examples
///
/// ```
/// use resourcepool::{PoolConfiguration, ResourcePool};
///
/// let pool = ResourcePool::new(PoolConfiguration::new().with_capacity(2), || vec![0u8; 1024])
///     .unwrap();
///
/// let buffer = pool.check_out().unwrap();
/// assert_eq!(buffer.len(), 1024);
/// pool.check_in(buffer);
/// ```
pub struct ResourcePool<T> {
    gate: AdmissionGate,
    store: ItemStack<T>,
    factory: Factory<T>,
    disposer: Option<Disposer<T>>,
    config: PoolConfiguration,
}

impl<T> ResourcePool<T> {
    /// Create a pool without a disposer; stored items are simply dropped on close.
    pub fn new<F>(config: PoolConfiguration, factory: F) -> PoolResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::build(config, Box::new(factory), None)
    }

    /// Create a pool that runs `disposer` on every item it discards.
    pub fn with_disposer<F, D>(
        config: PoolConfiguration,
        factory: F,
        disposer: D,
    ) -> PoolResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
        D: Fn(T) + Send + Sync + 'static,
    {
        Self::build(config, Box::new(factory), Some(Box::new(disposer)))
    }

    fn build(
        config: PoolConfiguration,
        factory: Factory<T>,
        disposer: Option<Disposer<T>>,
    ) -> PoolResult<Self> {
        config.validate()?;
        tracing::debug!(capacity = config.capacity, "created resource pool");

        Ok(Self {
            gate: AdmissionGate::new(config.capacity),
            store: ItemStack::with_capacity(config.capacity),
            factory,
            disposer,
            config,
        })
    }

    /// Check out an item, blocking while `capacity` items are already out.
    pub fn check_out(&self) -> PoolResult<T> {
        let permit = self.gate.acquire()?;
        Ok(self.pop_or_create(permit))
    }

    /// Check out an item, suspending the task while the pool is exhausted.
    ///
    /// Cancelling the returned future before it completes does not consume
    /// a permit.
    pub async fn check_out_async(&self) -> PoolResult<T> {
        let permit = self.gate.acquire_async().await?;
        Ok(self.pop_or_create(permit))
    }

    /// Check out an item only if a permit is free right now.
    pub fn try_check_out(&self) -> PoolResult<Option<T>> {
        Ok(self
            .gate
            .try_acquire()?
            .map(|permit| self.pop_or_create(permit)))
    }

    /// Blocking checkout that fails with [`PoolError::Timeout`] after `timeout`.
    pub fn check_out_timeout(&self, timeout: Duration) -> PoolResult<T> {
        let permit = self.gate.acquire_timeout(timeout)?;
        Ok(self.pop_or_create(permit))
    }

    /// Async checkout that fails with [`PoolError::Timeout`] after `timeout`.
    pub async fn check_out_async_timeout(&self, timeout: Duration) -> PoolResult<T> {
        let permit = tokio::time::timeout(timeout, self.gate.acquire_async())
            .await
            .map_err(|_| PoolError::Timeout(timeout))??;
        Ok(self.pop_or_create(permit))
    }

    /// Return an item and free its permit.
    ///
    /// After [`close`](Self::close) the item is disposed instead of stored.
    pub fn check_in(&self, item: T) {
        if let Err(item) = self.store.push(item) {
            tracing::debug!("item checked in after close, disposing");
            self.dispose(item);
        }
        self.gate.release();
    }

    /// Free a permit without returning an item, e.g. because the caller
    /// found its item broken and dropped it. The next checkout builds a
    /// replacement.
    pub fn discard(&self) {
        self.gate.release();
    }

    /// Borrow an item behind a guard that checks it back in on drop.
    ///
    /// Honors [`PoolConfiguration::checkout_timeout`] when it is set.
    pub fn lease(&self) -> PoolResult<Lease<'_, T>> {
        let item = match self.config.checkout_timeout {
            Some(timeout) => self.check_out_timeout(timeout)?,
            None => self.check_out()?,
        };
        Ok(Lease::new(self, item))
    }

    /// Async counterpart of [`lease`](Self::lease).
    pub async fn lease_async(&self) -> PoolResult<Lease<'_, T>> {
        let item = match self.config.checkout_timeout {
            Some(timeout) => self.check_out_async_timeout(timeout).await?,
            None => self.check_out_async().await?,
        };
        Ok(Lease::new(self, item))
    }

    /// Close the pool: reject further checkouts and dispose every stored item.
    ///
    /// Items checked out at this point are not touched here; they are
    /// disposed when they come back through [`check_in`](Self::check_in).
    /// Closing twice is a no-op.
    pub fn close(&self) {
        if !self.gate.close() {
            return;
        }
        let items = self.store.seal_and_drain();
        tracing::debug!(disposed = items.len(), "closed resource pool");
        for item in items {
            self.dispose(item);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.gate.is_closed()
    }

    pub fn capacity(&self) -> usize {
        self.gate.capacity()
    }

    /// Number of further checkouts that would not block.
    pub fn available_permits(&self) -> usize {
        self.gate.available_permits()
    }

    /// Number of built items currently waiting in the store.
    pub fn idle_count(&self) -> usize {
        self.store.len()
    }

    pub(crate) fn dispose(&self, item: T) {
        if let Some(disposer) = &self.disposer {
            disposer(item);
        }
    }

    fn pop_or_create(&self, permit: Permit<'_>) -> T {
        let item = match self.store.pop() {
            Some(item) => item,
            None => {
                tracing::debug!("store empty, building new item");
                (self.factory)()
            }
        };
        permit.forget();
        item
    }
}

impl<T> Drop for ResourcePool<T> {
    fn drop(&mut self) {
        self.close();
    }
}
