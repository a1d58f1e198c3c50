//! Time Abstractions
//!
//! Provides an injectable time source so that record timestamps (and thus
//! pagination order) are deterministic under test, plus the log level type
//! shared by the logging configuration.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

/// Time source trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::time::Clock;
///
/// fn stamp(clock: &dyn Clock) -> i64 {
///     clock.unix_timestamp_millis()
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Get current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Get current Unix timestamp in seconds
    fn unix_timestamp(&self) -> i64 {
        self.now().timestamp()
    }

    /// Get current Unix timestamp in milliseconds
    fn unix_timestamp_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// System clock implementation using actual system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests.
///
/// Every call to [`Clock::now`] returns the current instant and then advances
/// it by `step_millis`, so consecutive writes get strictly increasing
/// timestamps. A step of zero freezes time, which is useful to force ties.
#[derive(Debug)]
pub struct ManualClock {
    current_millis: AtomicI64,
    step_millis: i64,
}

impl ManualClock {
    pub fn new(start_millis: i64, step_millis: i64) -> Self {
        Self {
            current_millis: AtomicI64::new(start_millis),
            step_millis,
        }
    }

    /// A clock that never advances
    pub fn frozen(at_millis: i64) -> Self {
        Self::new(at_millis, 0)
    }

    /// Jump to an absolute instant
    pub fn set(&self, millis: i64) {
        self.current_millis.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self
            .current_millis
            .fetch_add(self.step_millis, Ordering::SeqCst);
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
