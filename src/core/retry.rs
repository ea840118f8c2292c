//! Bounded retry of conflicted units of work
//!
//! Only `ConcurrencyConflict` is retried. Each attempt re-runs the whole
//! operation from scratch; a failed unit leaves nothing behind, so there is
//! never partial state to replay.

use tracing::warn;

use crate::types::{AccountId, LedgerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent
    pub fn run<T, F>(
        &self,
        operation: &str,
        account_id: AccountId,
        mut op: F,
    ) -> Result<T, LedgerError>
    where
        F: FnMut() -> Result<T, LedgerError>,
    {
        let mut attempt: u32 = 0;
        loop {
            match op() {
                Err(error) if error.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        operation,
                        account = account_id,
                        attempt,
                        max_retries = self.max_retries,
                        "retrying after concurrency conflict"
                    );
                }
                outcome => return outcome,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(crate::config::LedgerConfig::default().max_retries)
    }
}
