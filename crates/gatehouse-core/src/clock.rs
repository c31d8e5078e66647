//! Clock abstraction for lifetime stamping.

use chrono::{DateTime, Utc};

/// Source of the current instant.
///
/// The pipelines never call `Utc::now()` directly; hosts inject a clock so
/// lifetime stamping is deterministic under test.
pub trait SystemClock: Send + Sync {
    /// The current UTC instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct UtcClock;

impl SystemClock for UtcClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl SystemClock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
