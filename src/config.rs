//! Ledger configuration
//!
//! Controls how long a unit of work waits for a contended account lock and
//! how often a conflicted operation is re-run before the conflict is
//! surfaced to the caller.

use std::time::Duration;
use tracing::warn;

/// Tuning for the atomic units of work
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Extra attempts after a `ConcurrencyConflict`
    pub max_retries: u32,
    /// How long a unit of work waits for the account lock
    pub lock_wait: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            lock_wait: Duration::from_millis(250),
        }
    }
}

impl LedgerConfig {
    /// Create a new LedgerConfig with custom values
    ///
    /// A zero lock wait would make every contended unit fail, so it falls back
    /// to the default. Zero retries is valid (surface conflicts immediately).
    pub fn new(max_retries: u32, lock_wait_ms: u64) -> Self {
        let default = Self::default();

        let lock_wait = if lock_wait_ms == 0 {
            warn!(
                default_ms = default.lock_wait.as_millis() as u64,
                "Invalid lock_wait (0), using default"
            );
            default.lock_wait
        } else {
            Duration::from_millis(lock_wait_ms)
        };

        Self {
            max_retries,
            lock_wait,
        }
    }
}
