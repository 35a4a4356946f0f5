//! Async usage examples

use resourcepool::{PoolConfiguration, ResourcePool};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() {
    println!("=== resourcepool - Async Examples ===\n");

    // Example 1: Async checkout
    async_checkout().await;

    // Example 2: Waiting on capacity with a timeout
    async_with_timeout().await;

    // Example 3: Concurrent access
    concurrent_access().await;
}

async fn async_checkout() {
    println!("1. Async Checkout:");
    let pool = ResourcePool::new(PoolConfiguration::new().with_capacity(2), || 7).unwrap();

    let item = pool.check_out_async().await.unwrap();
    println!("   Got item asynchronously: {item}");
    pool.check_in(item);

    println!();
}

async fn async_with_timeout() {
    println!("2. Async with Timeout:");

    let config = PoolConfiguration::new()
        .with_capacity(1)
        .with_checkout_timeout(Duration::from_millis(100));
    let pool = ResourcePool::new(config, || 42).unwrap();

    let _held = pool.lease_async().await.unwrap();

    // Capacity is exhausted, so this waits and then gives up
    match pool.lease_async().await {
        Ok(_) => println!("   Got item"),
        Err(e) => println!("   Error: {e}"),
    }

    println!();
}

async fn concurrent_access() {
    println!("3. Concurrent Access:");

    let config = PoolConfiguration::new().with_capacity(3);
    let pool = Arc::new(ResourcePool::new(config, || 0u64).unwrap());
    let mut handles = vec![];

    for i in 0..10 {
        let pool = Arc::clone(&pool);
        let handle = tokio::spawn(async move {
            let mut counter = pool.lease_async().await.unwrap();
            *counter += 1;
            sleep(Duration::from_millis(10)).await;
            println!("   Task {i} bumped a counter to {}", *counter);
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    println!("   Items built: {}", pool.idle_count());
}
