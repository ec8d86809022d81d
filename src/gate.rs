//! Cooldown-based debounce gate.
//!
//! A gate turns "motion observed" into "action may fire now". It is a latched
//! timer: `try_fire` succeeds when the gate has never fired or when at least
//! `cooldown` has elapsed since its last fire. Nothing resets the gate while
//! motion is absent.

use std::time::{Duration, SystemTime};

#[derive(Clone, Debug)]
pub struct DebounceGate {
    name: &'static str,
    cooldown: Duration,
    last_fired_at: Option<SystemTime>,
}

impl DebounceGate {
    pub fn new(name: &'static str, cooldown: Duration) -> Self {
        Self {
            name,
            cooldown,
            last_fired_at: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn last_fired_at(&self) -> Option<SystemTime> {
        self.last_fired_at
    }

    /// True when a `try_fire(now)` call would succeed. Does not change state.
    ///
    /// If the clock reads earlier than the last fire, the cooldown is treated
    /// as not elapsed.
    pub fn is_eligible(&self, now: SystemTime) -> bool {
        match self.last_fired_at {
            None => true,
            Some(last) => match now.duration_since(last) {
                Ok(elapsed) => elapsed >= self.cooldown,
                Err(_) => {
                    log::debug!("{} gate: clock moved backwards, holding cooldown", self.name);
                    false
                }
            },
        }
    }

    /// Fire if eligible, recording `now` as the last fire time.
    pub fn try_fire(&mut self, now: SystemTime) -> bool {
        if !self.is_eligible(now) {
            return false;
        }
        self.last_fired_at = Some(now);
        true
    }
}
