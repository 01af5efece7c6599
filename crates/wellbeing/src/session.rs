//! Work/away session bookkeeping

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Source of "now" for the session clock
pub trait Clock: Send {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Work session clock.
///
/// The work session restarts whenever the user is seen away, so work time
/// counts from the moment they came back.
#[derive(Debug, Clone)]
pub struct SessionClock {
    work_start: Instant,
    last_away: Option<Instant>,
}

impl SessionClock {
    pub fn new(now: Instant) -> Self {
        Self {
            work_start: now,
            last_away: None,
        }
    }

    /// Apply one presence observation taken at `now`
    pub fn update(&mut self, is_away: bool, now: Instant) {
        if is_away {
            if self.last_away.is_none() {
                self.last_away = Some(now);
            }
            self.work_start = now;
        } else {
            self.last_away = None;
        }
    }

    pub fn work_duration(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.work_start)
    }

    pub fn work_minutes(&self, now: Instant) -> f64 {
        self.work_duration(now).as_secs_f64() / 60.0
    }

    pub fn work_start(&self) -> Instant {
        self.work_start
    }

    /// When the current away period began, if the user is away
    pub fn last_away(&self) -> Option<Instant> {
        self.last_away
    }

    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }
}
