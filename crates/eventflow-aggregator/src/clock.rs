//! The aggregator's injected time source (§4.F, §7 error kind 4).
//!
//! Kept as a trait for the same reason [`eventflow_store::TaskStore`] is a
//! trait: `generate_incomplete_events` needs "now" to compute a synthetic
//! `actual_runtime`, and tests need to supply a fixed value rather than
//! racing the wall clock.

use std::time::{SystemTime, UNIX_EPOCH};

/// A source of "now", expressed as seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Current time, in seconds since the Unix epoch.
    fn now(&self) -> f64;
}

/// The real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the Unix epoch")
            .as_secs_f64()
    }
}

#[cfg(test)]
/// A fixed clock for deterministic tests.
pub struct FixedClock(pub f64);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> f64 {
        self.0
    }
}
