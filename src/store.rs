//! Concurrent containers for available items

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::record::ItemRecord;

struct StackState<T> {
    items: Vec<T>,
    sealed: bool,
}

/// LIFO stack of idle items for the basic pool.
///
/// Once sealed (at pool close) pushes are refused and handed back to the
/// caller, so nothing can slip in after the final drain.
pub(crate) struct ItemStack<T> {
    state: Mutex<StackState<T>>,
}

impl<T> ItemStack<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(StackState {
                items: Vec::with_capacity(capacity),
                sealed: false,
            }),
        }
    }

    /// Push an item, or get it back if the stack has been sealed.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut state = self.state.lock();
        if state.sealed {
            return Err(item);
        }
        state.items.push(item);
        Ok(())
    }

    pub fn pop(&self) -> Option<T> {
        self.state.lock().items.pop()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Refuse further pushes and take everything currently stored.
    pub fn seal_and_drain(&self) -> Vec<T> {
        let mut state = self.state.lock();
        state.sealed = true;
        std::mem::take(&mut state.items)
    }
}

/// Arena of item records for the self-cleaning pool, keyed by item identity.
///
/// Records are never moved out to be inspected: checkouts claim them in
/// place, and eviction decides and removes a record under the shard lock
/// in one step, so a sweep never hides records from concurrent checkouts.
pub(crate) struct RecordStore<T> {
    records: DashMap<usize, ItemRecord<T>>,
}

/// Identity key of a pooled item: the address of its shared allocation.
pub(crate) fn identity<T>(item: &Arc<T>) -> usize {
    Arc::as_ptr(item) as usize
}

impl<T> RecordStore<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
        }
    }

    pub fn insert(&self, record: ItemRecord<T>) {
        self.records.insert(identity(record.item()), record);
    }

    /// Claim the first idle record found and return its item.
    pub fn claim_idle(&self) -> Option<Arc<T>> {
        self.records.iter().find_map(|entry| {
            let record = entry.value();
            record.try_check_out().then(|| Arc::clone(record.item()))
        })
    }

    pub fn contains(&self, key: usize) -> bool {
        self.records.contains_key(&key)
    }

    /// Mark the record under `key` idle.
    ///
    /// `None` if nothing is tracked under `key`, `Some(false)` if the record
    /// was already idle.
    pub fn release(&self, key: usize) -> Option<bool> {
        self.records.get(&key).map(|record| record.release())
    }

    /// Remove the record under `key` whatever its state.
    pub fn remove(&self, key: usize) -> Option<ItemRecord<T>> {
        self.records.remove(&key).map(|(_, record)| record)
    }

    /// Remove the record under `key` if it is idle.
    pub fn take_idle(&self, key: usize) -> Option<ItemRecord<T>> {
        self.records
            .remove_if(&key, |_, record| record.try_claim())
            .map(|(_, record)| record)
    }

    /// Remove the record under `key` if it is idle and its idle time
    /// reached `lifetime`.
    pub fn take_expired(&self, key: usize, lifetime: Duration) -> Option<ItemRecord<T>> {
        // Decided under the shard write lock, so no checkout can claim the
        // record between the expiry test and the removal.
        self.records
            .remove_if(&key, |_, record| record.is_expired(lifetime) && record.try_claim())
            .map(|(_, record)| record)
    }

    /// Keys of the records that currently look expired.
    pub fn expired_keys(&self, lifetime: Duration) -> Vec<usize> {
        self.records
            .iter()
            .filter(|entry| entry.value().is_expired(lifetime))
            .map(|entry| *entry.key())
            .collect()
    }

    pub fn keys(&self) -> Vec<usize> {
        self.records.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn idle_count(&self) -> usize {
        self.records
            .iter()
            .filter(|entry| !entry.value().is_in_use())
            .count()
    }
}
