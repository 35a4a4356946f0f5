use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use resourcepool::{PoolConfiguration, PoolError, ResourcePool};

#[derive(Debug, Default)]
struct Client {
    id: usize,
    secure: bool,
}

fn client_pool(capacity: usize) -> ResourcePool<Client> {
    let next_id = AtomicUsize::new(0);
    ResourcePool::with_disposer(
        PoolConfiguration::new().with_capacity(capacity),
        move || Client {
            id: next_id.fetch_add(1, Ordering::SeqCst),
            secure: false,
        },
        drop,
    )
    .unwrap()
}

#[test]
fn checkout_returns_item() {
    let pool = client_pool(5);
    let client = pool.check_out().unwrap();
    assert_eq!(client.id, 0);
}

#[tokio::test]
async fn checkout_async_returns_item() {
    let pool = client_pool(5);
    let client = pool.check_out_async().await.unwrap();
    assert_eq!(client.id, 0);
}

#[tokio::test]
async fn checkout_blocks_at_capacity() {
    let pool = client_pool(1);
    let _client = pool.check_out().unwrap();

    let waited = tokio::time::timeout(Duration::from_millis(100), pool.check_out_async()).await;
    assert!(waited.is_err(), "second checkout must wait for a check-in");
}

#[tokio::test]
async fn checkout_async_blocks_at_capacity() {
    let pool = client_pool(1);
    let _client = pool.check_out_async().await.unwrap();

    let waited = tokio::time::timeout(Duration::from_millis(100), pool.check_out_async()).await;
    assert!(waited.is_err(), "second checkout must wait for a check-in");
    assert_eq!(pool.available_permits(), 0);
}

#[tokio::test]
async fn checkin_allows_other_caller_to_checkout() {
    let pool = client_pool(1);
    let client = pool.check_out_async().await.unwrap();
    let id = client.id;
    pool.check_in(client);

    let again = pool.check_out_async().await.unwrap();
    assert_eq!(again.id, id);
}

#[tokio::test]
async fn discard_allows_other_caller_to_checkout() {
    let pool = client_pool(1);
    let client = pool.check_out_async().await.unwrap();
    drop(client);
    pool.discard();

    let replacement = pool.check_out_async().await.unwrap();
    assert_eq!(replacement.id, 1);
}

#[test]
fn lease_gives_exclusive_access_until_dropped() {
    let pool = client_pool(1);
    {
        let mut client = pool.lease().unwrap();
        client.secure = true;
        assert!(pool.try_check_out().unwrap().is_none());
    }

    let client = pool.check_out().unwrap();
    assert!(client.secure);
}

#[test]
fn lease_discard_builds_replacement() {
    let pool = client_pool(1);
    let lease = pool.lease().unwrap();
    lease.discard();

    assert_eq!(pool.available_permits(), 1);
    assert_eq!(pool.check_out().unwrap().id, 1);
}

#[test]
fn waiting_thread_resumes_after_check_in() {
    let pool = Arc::new(client_pool(1));
    let held = pool.check_out().unwrap();

    let (tx, rx) = mpsc::channel();
    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || {
            let client = pool.check_out().unwrap();
            tx.send(client.id).unwrap();
            pool.check_in(client);
        })
    };

    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    pool.check_in(held);
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 0);
    waiter.join().unwrap();
}

#[test]
fn never_more_than_capacity_checked_out() {
    const CAPACITY: usize = 3;
    let config = PoolConfiguration::new().with_capacity(CAPACITY);
    let pool = Arc::new(ResourcePool::new(config, Client::default).unwrap());
    let out = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = (0..12)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let out = Arc::clone(&out);
            let peak = Arc::clone(&peak);
            thread::spawn(move || {
                for _ in 0..50 {
                    let client = pool.check_out().unwrap();
                    let now = out.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::yield_now();
                    out.fetch_sub(1, Ordering::SeqCst);
                    pool.check_in(client);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
    assert!(peak.load(Ordering::SeqCst) <= CAPACITY);
    assert_eq!(pool.available_permits(), CAPACITY);
    assert!(pool.idle_count() <= CAPACITY);
}

#[test]
fn close_is_idempotent_and_rejects_checkouts() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&disposed);
    let pool = ResourcePool::with_disposer(
        PoolConfiguration::new().with_capacity(2),
        Client::default,
        move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        },
    )
    .unwrap();

    let client = pool.check_out().unwrap();
    pool.check_in(client);
    pool.close();
    pool.close();

    assert!(pool.is_closed());
    assert_eq!(disposed.load(Ordering::SeqCst), 1);
    assert_eq!(pool.check_out().unwrap_err(), PoolError::Closed);
}

#[tokio::test]
async fn close_wakes_suspended_checkout() {
    let pool = Arc::new(client_pool(1));
    let _held = pool.check_out().unwrap();

    let waiter = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move { pool.check_out_async().await.map(|client| client.id) })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    pool.close();

    assert_eq!(waiter.await.unwrap(), Err(PoolError::Closed));
}
