use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use time::OffsetDateTime;

use crate::domain::now_utc;

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        now_utc()
    }
}

pub type ExpiryCallback = Box<dyn FnOnce() + Send + 'static>;

/// Runs a callback once after a fixed delay.
pub trait ExpiryScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, expire: ExpiryCallback);
    /// Drops every pending callback without running it.
    fn cancel_all(&self);
}

/// Hand-driven clock for tests. Also acts as an [`ExpiryScheduler`]: pending
/// callbacks fire from [`ManualClock::advance`] once their due time is reached.
#[derive(Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualInner>>,
}

struct ManualInner {
    now: OffsetDateTime,
    pending: Vec<(OffsetDateTime, ExpiryCallback)>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualInner {
                now: start,
                pending: Vec::new(),
            })),
        }
    }

    pub fn advance(&self, by: Duration) {
        let due = {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.now += by;
            let now = inner.now;
            let (due, waiting): (Vec<_>, Vec<_>) =
                inner.pending.drain(..).partition(|(at, _)| *at <= now);
            inner.pending = waiting;
            due
        };
        // Callbacks run outside the lock so they may schedule again.
        for (_, expire) in due {
            expire();
        }
    }

    pub fn pending(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .len()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).now
    }
}

impl ExpiryScheduler for ManualClock {
    fn schedule(&self, delay: Duration, expire: ExpiryCallback) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let at = inner.now + delay;
        inner.pending.push((at, expire));
    }

    fn cancel_all(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .clear();
    }
}
