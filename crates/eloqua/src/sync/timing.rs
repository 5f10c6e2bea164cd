//! Time source for the export engine
//!
//! Polling sleeps and the "now" that closes each stream's first window both
//! go through [`Clock`], so tests can run the whole state machine without
//! real waits.

use chrono::{Local, NaiveDateTime, TimeDelta};
use std::sync::Mutex;
use std::time::Duration;

/// Wall clock and sleeping, injectable for tests
pub trait Clock: Send + Sync {
    /// Current local time, the form the vendor's filters are evaluated in
    fn now(&self) -> NaiveDateTime;

    /// Block the calling thread
    fn sleep(&self, duration: Duration);
}

/// Real local clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Clock that never blocks: sleeping advances a fixed "now" and is recorded
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        let delta = TimeDelta::from_std(duration).unwrap_or(TimeDelta::zero());
        *self.now.lock().unwrap() += delta;
    }
}
