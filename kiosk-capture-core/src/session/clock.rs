use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Wall-clock timestamps driven by the tokio monotonic clock.
///
/// Timestamps are strictly ordered with the timers that produced them, and
/// follow paused time in tests.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    wall_origin: DateTime<Utc>,
    mono_origin: Instant,
}

impl SessionClock {
    pub fn start() -> Self {
        Self {
            wall_origin: Utc::now(),
            mono_origin: Instant::now(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.at(Instant::now())
    }

    pub fn at(&self, instant: Instant) -> DateTime<Utc> {
        let offset = instant.saturating_duration_since(self.mono_origin);
        self.wall_origin + chrono::Duration::from_std(offset).unwrap_or_else(|_| chrono::Duration::zero())
    }
}
