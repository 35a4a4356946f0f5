//! Basic usage examples for ResourcePool

use resourcepool::{PoolConfiguration, ResourcePool};

fn main() {
    println!("=== resourcepool - Basic Examples ===\n");

    // Example 1: Explicit check-out / check-in
    explicit_checkout();

    // Example 2: RAII leases
    leases();

    // Example 3: Try methods and discard
    try_and_discard();

    // Example 4: Closing with a disposer
    closing();
}

fn explicit_checkout() {
    println!("1. Explicit Checkout:");
    let config = PoolConfiguration::new().with_capacity(3);
    let pool = ResourcePool::new(config, || vec![0u8; 4096]).unwrap();

    let buffer = pool.check_out().unwrap();
    println!("   Got buffer of {} bytes", buffer.len());
    pool.check_in(buffer);

    println!("   Idle after check-in: {}\n", pool.idle_count());
}

fn leases() {
    println!("2. Leases:");
    let pool = ResourcePool::new(PoolConfiguration::new().with_capacity(2), String::new).unwrap();

    {
        let mut first = pool.lease().unwrap();
        first.push_str("warm");
        let _second = pool.lease().unwrap();
        println!("   Permits while leased: {}", pool.available_permits());
    }

    println!("   Permits after drop: {}", pool.available_permits());
    println!("   Next lease sees: {:?}\n", *pool.lease().unwrap());
}

fn try_and_discard() {
    println!("3. Try Methods:");
    let pool = ResourcePool::new(PoolConfiguration::new().with_capacity(1), || 42).unwrap();

    let item = pool.try_check_out().unwrap();
    assert!(item.is_some());
    println!("   First try: Success");

    assert!(pool.try_check_out().unwrap().is_none());
    println!("   Second try: None (capacity reached)");

    // The item turned out broken: give the permit back without it.
    pool.discard();
    assert!(pool.try_check_out().unwrap().is_some());
    println!("   After discard: Success\n");
}

fn closing() {
    println!("4. Closing:");
    let pool = ResourcePool::with_disposer(
        PoolConfiguration::new().with_capacity(2),
        || String::from("connection"),
        |conn| println!("   Disposing {conn}"),
    )
    .unwrap();

    let conn = pool.check_out().unwrap();
    pool.check_in(conn);
    pool.close();

    match pool.check_out() {
        Ok(_) => println!("   Unexpected checkout"),
        Err(e) => println!("   Error: {e}"),
    }
}
