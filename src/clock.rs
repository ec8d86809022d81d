//! Time source for the pipeline.
//!
//! Gate decisions, iteration pacing and snapshot names all read time through
//! `Clock` so tests can drive the loop from a simulated timeline.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

pub trait Clock {
    /// Current wall-clock time.
    fn now(&self) -> SystemTime;

    /// Block the pipeline thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Real wall clock backed by `SystemTime` and `std::thread::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Simulated clock. `sleep` advances time instantly.
///
/// Clones share the same timeline, so a test can keep a handle while the
/// pipeline owns another.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<SystemTime>>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Clock starting at the Unix epoch.
    pub fn at_epoch() -> Self {
        Self::new(SystemTime::UNIX_EPOCH)
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += duration;
    }

    pub fn set(&self, at: SystemTime) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now = at;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> SystemTime {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_sleep_advances_shared_timeline() {
        let clock = ManualClock::at_epoch();
        let handle = clock.clone();

        clock.sleep(Duration::from_millis(250));
        handle.advance(Duration::from_secs(1));

        let elapsed = clock
            .now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap();
        assert_eq!(elapsed, Duration::from_millis(1250));
    }

    #[test]
    fn manual_clock_set_moves_backwards() {
        let clock = ManualClock::new(SystemTime::UNIX_EPOCH + Duration::from_secs(10));
        clock.set(SystemTime::UNIX_EPOCH);
        assert_eq!(clock.now(), SystemTime::UNIX_EPOCH);
    }
}
