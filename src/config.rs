//! Engine configuration.
//!
//! All fields have defaults, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Max wait for a submission's lock set (ms).
    pub lock_timeout_ms: u64,
    /// Max re-plans when the required lock set grows between the unlocked
    /// peek and the locked re-read.
    pub lock_attempts: u32,
    /// Fill cells that name a subject but no resource from the directory's
    /// standing staffing.
    pub auto_staff: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 5_000,
            lock_attempts: 8,
            auto_staff: true,
        }
    }
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON config; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets the lock wait timeout.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the re-plan limit (at least 1).
    pub fn with_lock_attempts(mut self, attempts: u32) -> Self {
        self.lock_attempts = attempts.max(1);
        self
    }

    /// Enables or disables default staffing.
    pub fn with_auto_staff(mut self, on: bool) -> Self {
        self.auto_staff = on;
        self
    }

    #[inline]
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
