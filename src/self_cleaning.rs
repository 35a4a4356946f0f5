//! Resource pool that evicts items left idle past their lifetime

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::atomic::AtomicCell;
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::config::PoolConfiguration;
use crate::errors::{PoolError, PoolResult};
use crate::gate::{AdmissionGate, Permit};
use crate::lease::CleaningLease;
use crate::pool::{Disposer, Factory};
use crate::record::ItemRecord;
use crate::store::{self, RecordStore};

/// State shared between the pool handle and its cleaner thread.
struct Shared<T> {
    gate: AdmissionGate,
    store: RecordStore<T>,
    factory: Factory<T>,
    disposer: Option<Disposer<T>>,
    item_lifetime: AtomicCell<Duration>,
}

impl<T> Shared<T> {
    fn claim_or_create(&self, permit: Permit<'_>) -> Arc<T> {
        let item = self.store.claim_idle().unwrap_or_else(|| {
            let item = Arc::new((self.factory)());
            self.store.insert(ItemRecord::new_in_use(Arc::clone(&item)));
            tracing::debug!(tracked = self.store.len(), "no idle item, built a new one");
            item
        });
        permit.forget();
        item
    }

    /// Evict and dispose idle records past the current lifetime.
    ///
    /// Each record is disposed right after its removal, so a panicking
    /// disposer leaves the remaining records for the next sweep.
    fn sweep(&self) -> usize {
        let lifetime = self.item_lifetime.load();
        let mut evicted = 0;
        for key in self.store.expired_keys(lifetime) {
            if let Some(record) = self.store.take_expired(key, lifetime) {
                evicted += 1;
                self.dispose(record);
            }
        }
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.store.len(), "evicted idle items");
        }
        evicted
    }

    fn dispose(&self, record: ItemRecord<T>) {
        match Arc::try_unwrap(record.into_item()) {
            Ok(item) => {
                if let Some(disposer) = &self.disposer {
                    disposer(item);
                }
            }
            Err(_) => {
                tracing::warn!("item still referenced outside the pool, dropped without disposer");
            }
        }
    }
}

struct Cleaner {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

impl Cleaner {
    fn spawn<T>(shared: Arc<Shared<T>>, interval: Duration) -> PoolResult<Self>
    where
        T: Send + Sync + 'static,
    {
        let (shutdown, signal) = channel::bounded::<()>(0);
        let handle = thread::Builder::new()
            .name("resource-pool-cleaner".to_string())
            .spawn(move || {
                loop {
                    match signal.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            let swept = panic::catch_unwind(AssertUnwindSafe(|| shared.sweep()));
                            if swept.is_err() {
                                tracing::error!("disposer panicked during idle sweep");
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                tracing::debug!("cleaner stopped");
            })
            .map_err(|err| PoolError::CleanerSpawn(err.to_string()))?;

        Ok(Self { shutdown, handle })
    }

    fn stop(self) {
        drop(self.shutdown);
        if self.handle.join().is_err() {
            tracing::error!("cleaner thread terminated abnormally");
        }
    }
}

/// A bounded pool that also disposes items nobody has checked out for
/// `item_lifetime`, sweeping every `clean_interval` on a background thread.
///
/// Items are handed out as `Arc<T>` and recognized on check-in by identity,
/// so callers must return the same handle they received.
///
/// # Examples
///
/// ```
/// use resourcepool::{PoolConfiguration, SelfCleaningPool};
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_capacity(4)
///     .with_clean_interval(Duration::from_secs(30))
///     .with_item_lifetime(Duration::from_secs(120));
///
/// let pool = SelfCleaningPool::new(config, || String::from("client")).unwrap();
/// let client = pool.check_out().unwrap();
/// assert_eq!(client.as_str(), "client");
/// pool.check_in(client).unwrap();
/// assert_eq!(pool.idle_count(), 1);
/// ```
pub struct SelfCleaningPool<T> {
    shared: Arc<Shared<T>>,
    cleaner: Mutex<Option<Cleaner>>,
    clean_interval: Duration,
    checkout_timeout: Option<Duration>,
}

impl<T: Send + Sync + 'static> SelfCleaningPool<T> {
    /// Create a pool without a disposer; evicted items are simply dropped.
    pub fn new<F>(config: PoolConfiguration, factory: F) -> PoolResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::build(config, Box::new(factory), None)
    }

    /// Create a pool that runs `disposer` on every evicted or closed item.
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
        config.validate_cleaning()?;

        let shared = Arc::new(Shared {
            gate: AdmissionGate::new(config.capacity),
            store: RecordStore::with_capacity(config.capacity),
            factory,
            disposer,
            item_lifetime: AtomicCell::new(config.item_lifetime),
        });
        let cleaner = Cleaner::spawn(Arc::clone(&shared), config.clean_interval)?;

        tracing::debug!(
            capacity = config.capacity,
            clean_interval = ?config.clean_interval,
            item_lifetime = ?config.item_lifetime,
            "created self-cleaning resource pool"
        );

        Ok(Self {
            shared,
            cleaner: Mutex::new(Some(cleaner)),
            clean_interval: config.clean_interval,
            checkout_timeout: config.checkout_timeout,
        })
    }
}

impl<T> SelfCleaningPool<T> {
    /// Check out an item, blocking while `capacity` items are already out.
    ///
    /// An idle item is reused if one exists; otherwise the factory builds
    /// a new one.
    pub fn check_out(&self) -> PoolResult<Arc<T>> {
        let permit = self.shared.gate.acquire()?;
        Ok(self.shared.claim_or_create(permit))
    }

    /// Check out an item, suspending the task while the pool is exhausted.
    pub async fn check_out_async(&self) -> PoolResult<Arc<T>> {
        let permit = self.shared.gate.acquire_async().await?;
        Ok(self.shared.claim_or_create(permit))
    }

    /// Check out an item only if a permit is free right now.
    pub fn try_check_out(&self) -> PoolResult<Option<Arc<T>>> {
        Ok(self
            .shared
            .gate
            .try_acquire()?
            .map(|permit| self.shared.claim_or_create(permit)))
    }

    /// Blocking checkout that fails with [`PoolError::Timeout`] after `timeout`.
    pub fn check_out_timeout(&self, timeout: Duration) -> PoolResult<Arc<T>> {
        let permit = self.shared.gate.acquire_timeout(timeout)?;
        Ok(self.shared.claim_or_create(permit))
    }

    /// Async checkout that fails with [`PoolError::Timeout`] after `timeout`.
    pub async fn check_out_async_timeout(&self, timeout: Duration) -> PoolResult<Arc<T>> {
        let permit = tokio::time::timeout(timeout, self.shared.gate.acquire_async())
            .await
            .map_err(|_| PoolError::Timeout(timeout))??;
        Ok(self.shared.claim_or_create(permit))
    }

    /// Return an item and free its permit.
    ///
    /// Fails with [`PoolError::UnrecognizedItem`] if `item` was not handed
    /// out by this pool, leaving the permit count untouched.
    pub fn check_in(&self, item: Arc<T>) -> PoolResult<()> {
        let shared = &self.shared;
        // Looked up while `item` is alive so its address cannot be reused.
        let key = store::identity(&item);
        if !shared.store.contains(key) {
            return Err(PoolError::UnrecognizedItem);
        }
        // Once the record turns idle a sweep may evict it, and the disposer
        // only runs if the record holds the last handle.
        drop(item);

        match shared.store.release(key) {
            None => return Err(PoolError::UnrecognizedItem),
            Some(true) => shared.gate.release(),
            Some(false) => tracing::warn!("item checked in while already idle, ignoring"),
        }

        // Close only drains idle records; anything still out at that point
        // is disposed as it comes back.
        if shared.gate.is_closed() {
            if let Some(record) = shared.store.take_idle(key) {
                shared.dispose(record);
            }
        }
        Ok(())
    }

    /// Drop a broken item instead of returning it. The disposer runs on it
    /// and its permit is freed so the next checkout builds a replacement.
    pub fn discard(&self, item: Arc<T>) -> PoolResult<()> {
        let record = self
            .shared
            .store
            .remove(store::identity(&item))
            .ok_or(PoolError::UnrecognizedItem)?;
        let was_out = record.is_in_use();
        drop(item);
        self.shared.dispose(record);
        if was_out {
            self.shared.gate.release();
        }
        Ok(())
    }

    /// Borrow an item behind a guard that checks it back in on drop.
    ///
    /// Honors [`PoolConfiguration::checkout_timeout`] when it is set.
    pub fn lease(&self) -> PoolResult<CleaningLease<'_, T>> {
        let item = match self.checkout_timeout {
            Some(timeout) => self.check_out_timeout(timeout)?,
            None => self.check_out()?,
        };
        Ok(CleaningLease::new(self, item))
    }

    /// Async counterpart of [`lease`](Self::lease).
    pub async fn lease_async(&self) -> PoolResult<CleaningLease<'_, T>> {
        let item = match self.checkout_timeout {
            Some(timeout) => self.check_out_async_timeout(timeout).await?,
            None => self.check_out_async().await?,
        };
        Ok(CleaningLease::new(self, item))
    }

    /// Run one idle sweep on the calling thread and return how many items
    /// were evicted.
    pub fn clean_now(&self) -> usize {
        self.shared.sweep()
    }

    /// Stop the cleaner, reject further checkouts and dispose every idle item.
    ///
    /// Items still checked out are disposed when they are checked in.
    /// Closing twice is a no-op.
    pub fn close(&self) {
        let cleaner = self.cleaner.lock().take();
        if let Some(cleaner) = cleaner {
            cleaner.stop();
        }

        if !self.shared.gate.close() {
            return;
        }
        let mut disposed = 0;
        for key in self.shared.store.keys() {
            if let Some(record) = self.shared.store.take_idle(key) {
                disposed += 1;
                self.shared.dispose(record);
            }
        }
        tracing::debug!(
            disposed,
            outstanding = self.shared.store.len(),
            "closed self-cleaning resource pool"
        );
    }

    pub fn is_closed(&self) -> bool {
        self.shared.gate.is_closed()
    }

    pub fn capacity(&self) -> usize {
        self.shared.gate.capacity()
    }

    pub fn available_permits(&self) -> usize {
        self.shared.gate.available_permits()
    }

    /// Number of items the pool currently tracks, in use or idle.
    pub fn tracked_count(&self) -> usize {
        self.shared.store.len()
    }

    pub fn idle_count(&self) -> usize {
        self.shared.store.idle_count()
    }

    pub fn clean_interval(&self) -> Duration {
        self.clean_interval
    }

    pub fn item_lifetime(&self) -> Duration {
        self.shared.item_lifetime.load()
    }

    /// Change the idle threshold; takes effect from the next sweep.
    pub fn set_item_lifetime(&self, lifetime: Duration) {
        self.shared.item_lifetime.store(lifetime);
    }
}

impl<T> Drop for SelfCleaningPool<T> {
    fn drop(&mut self) {
        self.close();
    }
}
