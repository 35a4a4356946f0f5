//! Self-cleaning pool example

use resourcepool::{PoolConfiguration, SelfCleaningPool};
use std::thread;
use std::time::Duration;

struct Client {
    id: usize,
}

fn main() {
    println!("=== resourcepool - Self-Cleaning Example ===\n");

    let next_id = std::sync::atomic::AtomicUsize::new(0);
    let config = PoolConfiguration::new()
        .with_capacity(4)
        .with_clean_interval(Duration::from_millis(50))
        .with_item_lifetime(Duration::from_millis(150));

    let pool = SelfCleaningPool::with_disposer(
        config,
        move || Client {
            id: next_id.fetch_add(1, std::sync::atomic::Ordering::Relaxed),
        },
        |client: Client| println!("   Cleaner disposed client {}", client.id),
    )
    .unwrap();

    let a = pool.check_out().unwrap();
    let b = pool.check_out().unwrap();
    println!("   Checked out clients {} and {}", a.id, b.id);
    pool.check_in(a).unwrap();
    pool.check_in(b).unwrap();

    println!("   Tracked before idling: {}", pool.tracked_count());
    thread::sleep(Duration::from_millis(300));
    println!("   Tracked after idling: {}", pool.tracked_count());

    let fresh = pool.check_out().unwrap();
    println!("   Fresh client after eviction: {}", fresh.id);
    pool.check_in(fresh).unwrap();
}
