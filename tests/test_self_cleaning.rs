use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use resourcepool::{PoolConfiguration, PoolError, SelfCleaningPool};

struct Tracked {
    id: usize,
    disposed: Arc<AtomicUsize>,
}

impl Tracked {
    fn dispose(self) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

fn tracked_pool(
    capacity: usize,
    clean_interval: Duration,
    item_lifetime: Duration,
) -> (SelfCleaningPool<Tracked>, Arc<AtomicUsize>) {
    let disposed = Arc::new(AtomicUsize::new(0));
    let next_id = AtomicUsize::new(0);
    let handle = Arc::clone(&disposed);
    let pool = SelfCleaningPool::with_disposer(
        PoolConfiguration::new()
            .with_capacity(capacity)
            .with_clean_interval(clean_interval)
            .with_item_lifetime(item_lifetime),
        move || Tracked {
            id: next_id.fetch_add(1, Ordering::SeqCst),
            disposed: Arc::clone(&handle),
        },
        Tracked::dispose,
    )
    .unwrap();
    (pool, disposed)
}

#[test]
fn idle_item_is_evicted_by_cleaner() {
    let (pool, disposed) = tracked_pool(2, Duration::from_millis(20), Duration::from_millis(50));
    let item = pool.check_out().unwrap();
    assert_eq!(item.id, 0);
    pool.check_in(item).unwrap();

    thread::sleep(Duration::from_millis(250));
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
    assert_eq!(pool.tracked_count(), 0);

    let fresh = pool.check_out().unwrap();
    assert_eq!(fresh.id, 1);
}

#[test]
fn checked_out_item_survives_sweeps() {
    let (pool, disposed) = tracked_pool(1, Duration::from_millis(10), Duration::from_millis(10));
    let item = pool.check_out().unwrap();

    thread::sleep(Duration::from_millis(80));
    assert_eq!(disposed.load(Ordering::SeqCst), 0);
    assert_eq!(pool.tracked_count(), 1);
    pool.check_in(item).unwrap();
}

#[test]
fn foreign_item_is_rejected() {
    let (pool, _) = tracked_pool(2, Duration::from_secs(60), Duration::from_secs(60));
    let (other, _) = tracked_pool(2, Duration::from_secs(60), Duration::from_secs(60));
    let _mine = pool.check_out().unwrap();
    let theirs = other.check_out().unwrap();

    assert_eq!(pool.check_in(Arc::clone(&theirs)), Err(PoolError::UnrecognizedItem));
    assert_eq!(pool.available_permits(), 1);
    other.check_in(theirs).unwrap();
}

#[test]
fn capacity_blocks_extra_checkout() {
    let (pool, _) = tracked_pool(1, Duration::from_secs(60), Duration::from_secs(60));
    let held = pool.check_out().unwrap();

    let result = pool.check_out_timeout(Duration::from_millis(50));
    assert_eq!(result.err(), Some(PoolError::Timeout(Duration::from_millis(50))));

    pool.check_in(held).unwrap();
    assert!(pool.try_check_out().unwrap().is_some());
}

#[test]
fn concurrent_checkouts_never_share_an_item() {
    let (pool, _) = tracked_pool(4, Duration::from_millis(5), Duration::from_millis(1));
    let pool = Arc::new(pool);
    let in_use: Arc<dashmap::DashSet<usize>> = Arc::new(dashmap::DashSet::new());

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let in_use = Arc::clone(&in_use);
            thread::spawn(move || {
                for _ in 0..100 {
                    let item = pool.check_out().unwrap();
                    assert!(in_use.insert(item.id), "item handed to two callers");
                    thread::yield_now();
                    in_use.remove(&item.id);
                    pool.check_in(item).unwrap();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
    assert_eq!(pool.available_permits(), 4);
}

#[test]
fn close_twice_disposes_once() {
    let (pool, disposed) = tracked_pool(3, Duration::from_secs(60), Duration::from_secs(60));
    let a = pool.check_out().unwrap();
    let b = pool.check_out().unwrap();
    pool.check_in(a).unwrap();
    pool.check_in(b).unwrap();

    pool.close();
    pool.close();
    assert_eq!(disposed.load(Ordering::SeqCst), 2);
    assert_eq!(pool.check_out().err(), Some(PoolError::Closed));
}

#[test]
fn drop_stops_cleaner_and_disposes() {
    let (pool, disposed) = tracked_pool(2, Duration::from_millis(10), Duration::from_secs(60));
    let item = pool.check_out().unwrap();
    pool.check_in(item).unwrap();
    drop(pool);
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
}

#[test]
fn every_built_item_is_disposed_under_concurrent_sweeps() {
    let built = Arc::new(AtomicUsize::new(0));
    let disposed = Arc::new(AtomicUsize::new(0));
    let build_count = Arc::clone(&built);
    let dispose_count = Arc::clone(&disposed);
    let pool = Arc::new(
        SelfCleaningPool::with_disposer(
            PoolConfiguration::new()
                .with_capacity(1)
                .with_clean_interval(Duration::from_secs(3600))
                .with_item_lifetime(Duration::ZERO),
            move || build_count.fetch_add(1, Ordering::SeqCst),
            move |_| {
                dispose_count.fetch_add(1, Ordering::SeqCst);
            },
        )
        .unwrap(),
    );

    let stop = Arc::new(AtomicBool::new(false));
    let sweeper = {
        let pool = Arc::clone(&pool);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                pool.clean_now();
            }
        })
    };

    for _ in 0..20_000 {
        let item = pool.check_out().unwrap();
        pool.check_in(item).unwrap();
    }
    stop.store(true, Ordering::SeqCst);
    sweeper.join().unwrap();
    pool.close();

    assert_eq!(pool.tracked_count(), 0);
    assert_eq!(disposed.load(Ordering::SeqCst), built.load(Ordering::SeqCst));
}

#[test]
fn cleaner_survives_panicking_disposer() {
    let calls = Arc::new(AtomicUsize::new(0));
    let call_count = Arc::clone(&calls);
    let pool = SelfCleaningPool::with_disposer(
        PoolConfiguration::new()
            .with_capacity(3)
            .with_clean_interval(Duration::from_millis(10))
            .with_item_lifetime(Duration::from_millis(20)),
        || 0u32,
        move |_| {
            if call_count.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("disposer failed");
            }
        },
    )
    .unwrap();

    let items: Vec<_> = (0..3).map(|_| pool.check_out().unwrap()).collect();
    for item in items {
        pool.check_in(item).unwrap();
    }

    thread::sleep(Duration::from_millis(300));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(pool.tracked_count(), 0);
}

#[tokio::test]
async fn lease_async_checks_in_on_drop() {
    let (pool, _) = tracked_pool(1, Duration::from_secs(60), Duration::from_secs(60));
    let first_id = {
        let lease = pool.lease_async().await.unwrap();
        lease.id
    };
    assert_eq!(pool.idle_count(), 1);

    let lease = pool.lease_async().await.unwrap();
    assert_eq!(lease.id, first_id);
}
