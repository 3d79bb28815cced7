//! Timestamp source for record stamping.

use chrono::{DateTime, Utc};

/// Source of "now" for creation and modification timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock, truncated to the millisecond precision of stored datetimes so
/// a returned record equals its stored form.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        bson::DateTime::now().to_chrono()
    }
}
