//! Per-item lifecycle tracking for the self-cleaning pool

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam::atomic::AtomicCell;

/// Wraps one pooled item with its in-use flag and last checkout time.
///
/// The in-use flag only changes through compare-and-swap, so a record is
/// handed to at most one checkout (or to the cleaner) at a time.
pub(crate) struct ItemRecord<T> {
    item: Arc<T>,
    in_use: AtomicBool,
    last_used: AtomicCell<Instant>,
}

impl<T> ItemRecord<T> {
    /// A record for a freshly built item, already checked out.
    pub fn new_in_use(item: Arc<T>) -> Self {
        Self {
            item,
            in_use: AtomicBool::new(true),
            last_used: AtomicCell::new(Instant::now()),
        }
    }

    pub fn item(&self) -> &Arc<T> {
        &self.item
    }

    pub fn into_item(self) -> Arc<T> {
        self.item
    }

    pub fn is_in_use(&self) -> bool {
        self.in_use.load(Ordering::Acquire)
    }

    /// Flip idle -> in use. Fails if someone else holds the record.
    pub fn try_claim(&self) -> bool {
        self.in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Claim for a checkout, restarting the idle clock.
    pub fn try_check_out(&self) -> bool {
        if self.try_claim() {
            self.last_used.store(Instant::now());
            return true;
        }
        false
    }

    /// Flip in use -> idle. Returns `false` if the record was already idle.
    pub fn release(&self) -> bool {
        self.in_use
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn idle_for(&self) -> Duration {
        self.last_used.load().elapsed()
    }

    pub fn is_expired(&self, lifetime: Duration) -> bool {
        !self.is_in_use() && self.idle_for() >= lifetime
    }
}
