//! # resourcepool
//!
//! Bounded, thread-safe pool for expensive-to-create resources such as
//! network clients, connections or buffers.
//!
//! ## Features
//!
//! - At most `capacity` items checked out at once, enforced by a permit gate
//! - Blocking (`check_out`) and async (`check_out_async`) acquisition
//! - Lazy construction through a caller-supplied factory
//! - Optional disposer run on items the pool discards
//! - RAII leases that check items back in when dropped
//! - A self-cleaning variant that evicts items idle past their lifetime
//!
//! ## Quick Start
//!
//! ```rust
//! use resourcepool::{PoolConfiguration, ResourcePool};
//!
//! let pool = ResourcePool::new(PoolConfiguration::new().with_capacity(4), || 42).unwrap();
//! {
//!     let item = pool.lease().unwrap();
//!     println!("Got: {}", *item);
//!     // Item automatically checked in when `item` goes out of scope
//! }
//! ```

mod config;
mod errors;
mod gate;
mod lease;
mod pool;
mod record;
mod self_cleaning;
mod store;

pub use config::PoolConfiguration;
pub use errors::{PoolError, PoolResult};
pub use lease::{CleaningLease, Lease};
pub use pool::ResourcePool;
pub use self_cleaning::SelfCleaningPool;
