//! Time sources injected into timers so elapsed time can be tested without waiting.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

/// Monotonic instants measure elapsed time; wall time attributes worklogs.
pub trait Clock: Send + Sync {
    fn instant(&self) -> Instant;
    fn wall(&self) -> DateTime<Utc>;
}

pub type SharedClock = Arc<dyn Clock>;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn instant(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}
