// Small demo binary; see demos/ for fuller usage.
// Run with RUST_LOG=debug to watch the pool lifecycle.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use resourcepool::{PoolConfiguration, PoolResult, ResourcePool, SelfCleaningPool};

fn main() -> PoolResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let pool = Arc::new(ResourcePool::new(
        PoolConfiguration::new().with_capacity(2),
        || String::with_capacity(64),
    )?);

    let workers: Vec<_> = (0..4)
        .map(|id| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || -> PoolResult<()> {
                let mut buffer = pool.lease()?;
                buffer.clear();
                buffer.push_str(&format!("worker {id}"));
                tracing::info!(buffer = %buffer.as_str(), "using pooled buffer");
                thread::sleep(Duration::from_millis(20));
                Ok(())
            })
        })
        .collect();
    for worker in workers {
        if let Ok(result) = worker.join() {
            result?;
        }
    }
    tracing::info!(idle = pool.idle_count(), "basic pool done");

    let cleaning = SelfCleaningPool::with_disposer(
        PoolConfiguration::new()
            .with_capacity(2)
            .with_clean_interval(Duration::from_millis(50))
            .with_item_lifetime(Duration::from_millis(100)),
        || String::from("client"),
        |client| tracing::info!(%client, "disposing idle client"),
    )?;
    let client = cleaning.check_out()?;
    cleaning.check_in(client)?;
    thread::sleep(Duration::from_millis(250));
    tracing::info!(tracked = cleaning.tracked_count(), "self-cleaning pool after idle period");

    Ok(())
}
