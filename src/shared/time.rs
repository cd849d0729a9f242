use chrono::{DateTime, Utc};

/// Source of "now" for the ingestion pipeline
///
/// Readings without a usable timestamp take `now_epoch_seconds`, synthesized
/// document keys take `now_epoch_millis`, and `receivedAt` takes
/// `now_rfc3339`. All three must describe the same instant for a given clock.
pub trait Clock: Send + Sync {
    fn now_epoch_millis(&self) -> i64;

    fn now_epoch_seconds(&self) -> i64 {
        self.now_epoch_millis().div_euclid(1000)
    }

    /// e.g. "2024-01-15T10:30:00.123+00:00"
    fn now_rfc3339(&self) -> String {
        DateTime::from_timestamp_millis(self.now_epoch_millis())
            .unwrap_or_default()
            .to_rfc3339()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_epoch_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock frozen at one instant, for tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    epoch_millis: i64,
}

impl FixedClock {
    pub fn from_epoch_millis(epoch_millis: i64) -> Self {
        Self { epoch_millis }
    }

    pub fn from_rfc3339(timestamp: &str) -> Result<Self, chrono::ParseError> {
        let parsed = DateTime::parse_from_rfc3339(timestamp)?;
        Ok(Self::from_epoch_millis(parsed.timestamp_millis()))
    }
}

impl Clock for FixedClock {
    fn now_epoch_millis(&self) -> i64 {
        self.epoch_millis
    }
}
