//! Time source for TTL computation.
//!
//! All expiry math flows through a `Clock` owned by the store. Live
//! operation reads the wall clock; log replay freezes the clock to each
//! record's logical timestamp so TTLs computed during replay reflect the
//! original execution time, then thaws it before the post-replay sweep.

use std::time::{SystemTime, UNIX_EPOCH};

/// A time source that can be frozen to a fixed instant.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    frozen: Option<u64>,
}

impl Clock {
    /// Create a wall-clock time source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time as unix seconds, or the frozen instant if set.
    pub fn now(&self) -> u64 {
        match self.frozen {
            Some(t) => t,
            None => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Pin the clock to a fixed instant.
    pub fn freeze(&mut self, unix_seconds: u64) {
        self.frozen = Some(unix_seconds);
    }

    /// Return to wall-clock time.
    pub fn thaw(&mut self) {
        self.frozen = None;
    }

    /// Whether the clock is currently pinned.
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }
}
