//! Pool configuration options

use std::time::Duration;

use crate::errors::{PoolError, PoolResult};

/// Configuration for pool behavior
///
/// # Examples
///
/// ```
/// use resourcepool::PoolConfiguration;
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_capacity(8)
///     .with_clean_interval(Duration::from_secs(10))
///     .with_item_lifetime(Duration::from_secs(120));
///
/// assert_eq!(config.capacity, 8);
/// assert_eq!(config.item_lifetime, Duration::from_secs(120));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfiguration {
    /// Maximum number of items that can be checked out simultaneously
    pub capacity: usize,

    /// How often the cleaner sweeps idle items (self-cleaning pool only)
    pub clean_interval: Duration,

    /// Idle time after which an unused item is evicted (self-cleaning pool only)
    pub item_lifetime: Duration,

    /// Upper bound used by the timed checkout helpers
    pub checkout_timeout: Option<Duration>,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            capacity: 10,
            clean_interval: Duration::from_secs(60),
            item_lifetime: Duration::from_secs(300),
            checkout_timeout: None,
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pool capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use resourcepool::PoolConfiguration;
    ///
    /// let config = PoolConfiguration::new().with_capacity(3);
    /// assert_eq!(config.capacity, 3);
    /// ```
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the cleaner period
    pub fn with_clean_interval(mut self, interval: Duration) -> Self {
        self.clean_interval = interval;
        self
    }

    /// Set the idle lifetime of pooled items
    pub fn with_item_lifetime(mut self, lifetime: Duration) -> Self {
        self.item_lifetime = lifetime;
        self
    }

    /// Set the timeout used by `check_out_timeout` style helpers
    pub fn with_checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = Some(timeout);
        self
    }

    pub(crate) fn validate(&self) -> PoolResult<()> {
        if self.capacity == 0 {
            return Err(PoolError::InvalidCapacity);
        }
        Ok(())
    }

    pub(crate) fn validate_cleaning(&self) -> PoolResult<()> {
        self.validate()?;
        if self.clean_interval.is_zero() {
            return Err(PoolError::InvalidInterval);
        }
        Ok(())
    }
}
