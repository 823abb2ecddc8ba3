//! Clock and random implementations.

use crate::infrastructure::ports::{ClockPort, RandomPort};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// System random - uses real randomness.
pub struct SystemRandom;

impl SystemRandom {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomPort for SystemRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        use rand::Rng;
        rand::thread_rng().gen_range(min..=max)
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Fixed clock for testing.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Scripted random for testing: hands out the queued draws in order, then
/// repeats the last one.
#[cfg(test)]
pub struct ScriptedRandom {
    draws: std::sync::Mutex<std::collections::VecDeque<i32>>,
    last: std::sync::atomic::AtomicI32,
}

#[cfg(test)]
impl ScriptedRandom {
    pub fn new(draws: &[i32]) -> Self {
        Self {
            draws: std::sync::Mutex::new(draws.iter().copied().collect()),
            last: std::sync::atomic::AtomicI32::new(draws.last().copied().unwrap_or(50)),
        }
    }
}

#[cfg(test)]
impl RandomPort for ScriptedRandom {
    fn gen_range(&self, min: i32, max: i32) -> i32 {
        use std::sync::atomic::Ordering;
        let next = self
            .draws
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or_else(|| self.last.load(Ordering::SeqCst));
        next.clamp(min, max)
    }

    fn gen_uuid(&self) -> Uuid {
        Uuid::nil()
    }
}
