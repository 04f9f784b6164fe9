//! Element synchronization
//!
//! Every wait here is a bounded polling loop: probe, and if the condition
//! does not hold yet, sleep one interval and probe again. Transient driver
//! errors listed in the [`WaitSpec`] are retried through; anything else ends
//! the wait immediately.

pub mod engine;

pub use engine::WaitEngine;

use crate::driver::traits::{DriverError, Transient};
use std::time::Duration;

/// Poll interval used where poll latency matters most
pub const FINE_POLL: Duration = Duration::from_millis(10);

/// Poll interval for absence checks
pub const ABSENCE_POLL: Duration = Duration::from_millis(100);

/// Poll interval for locator lookups and value checks
pub const DEFAULT_POLL: Duration = Duration::from_millis(200);

/// How long a loading indicator gets to show up
pub const LOADING_APPEAR_TIMEOUT: Duration = Duration::from_secs(3);

/// How long a visible loading indicator gets to go away
pub const LOADING_DISAPPEAR_TIMEOUT: Duration = Duration::from_secs(120);

/// Whole budget of the value-equality wait, settle delay included
pub const VALUE_TIMEOUT: Duration = Duration::from_secs(1);

/// Settle delay after the value-equality wait first sees a mismatch
pub const VALUE_SETTLE: Duration = Duration::from_millis(500);

/// Timeout budget, poll interval and tolerated transient failures of one wait
#[derive(Debug, Clone)]
pub struct WaitSpec {
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub ignoring: Vec<Transient>,
}

impl WaitSpec {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: DEFAULT_POLL,
            ignoring: Vec::new(),
        }
    }

    pub fn polling_every(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn ignoring(mut self, transient: &[Transient]) -> Self {
        for t in transient {
            if !self.ignoring.contains(t) {
                self.ignoring.push(*t);
            }
        }
        self
    }

    /// Whether `error` should be retried instead of ending the wait
    pub fn tolerates(&self, error: &DriverError) -> bool {
        error
            .transient()
            .map_or(false, |t| self.ignoring.contains(&t))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("timed out after {elapsed:?} waiting for {what}{}", last_error_suffix(.last_error))]
    Timeout {
        what: String,
        elapsed: Duration,
        last_error: Option<String>,
    },
    #[error("wait for {what} was interrupted")]
    Interrupted { what: String },
    #[error(transparent)]
    Driver(#[from] DriverError),
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_deref()
        .map(|e| format!(" (last error: {})", e))
        .unwrap_or_default()
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}
