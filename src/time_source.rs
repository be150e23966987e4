//! Time source abstraction for supporting both real and mocked time.
//!
//! Every time-dependent component (both schedulers, the sun-times service)
//! receives an `Arc<dyn TimeSource>` at construction rather than reading the
//! system clock directly. Production code injects [`RealTimeSource`]; tests
//! inject [`MockTimeSource`] and move the clock by hand, which makes
//! minute-granularity trigger logic testable without waiting for actual
//! minutes to pass.

use chrono::{DateTime, Local};

#[cfg(any(test, feature = "testing-support"))]
use chrono::Duration as ChronoDuration;
#[cfg(any(test, feature = "testing-support"))]
use std::sync::Mutex;

/// Trait for abstracting wall-clock reads.
pub trait TimeSource: Send + Sync {
    /// Get the current local time.
    fn now(&self) -> DateTime<Local>;
}

/// Real-time implementation that uses the actual system clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Manually driven time source for tests.
///
/// The clock only moves when [`set`](MockTimeSource::set) or
/// [`advance`](MockTimeSource::advance) is called, so scheduler polls observe
/// exactly the instants a test arranges.
#[cfg(any(test, feature = "testing-support"))]
pub struct MockTimeSource {
    current: Mutex<DateTime<Local>>,
}

#[cfg(any(test, feature = "testing-support"))]
impl MockTimeSource {
    /// Create a mock clock frozen at the given instant.
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Jump the clock to an absolute instant.
    pub fn set(&self, instant: DateTime<Local>) {
        *self.current.lock().unwrap() = instant;
    }

    /// Move the clock forward by a duration.
    pub fn advance(&self, duration: ChronoDuration) {
        let mut guard = self.current.lock().unwrap();
        *guard += duration;
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl TimeSource for MockTimeSource {
    fn now(&self) -> DateTime<Local> {
        *self.current.lock().unwrap()
    }
}
