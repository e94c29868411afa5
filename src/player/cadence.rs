use std::time::{Duration, Instant};

/// Fixed-interval tick scheduler polled from the UI thread.
///
/// Missed ticks are not replayed: after a long frame the next tick is
/// scheduled one interval from now instead of firing a burst.
#[derive(Debug, Clone)]
pub struct Cadence {
    interval: Duration,
    next_due: Option<Instant>,
}

impl Cadence {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starting a running cadence keeps its current schedule.
    pub fn start(&mut self, now: Instant) {
        if self.next_due.is_none() {
            log::debug!("Cadence started ({:?})", self.interval);
            self.next_due = Some(now + self.interval);
        }
    }

    pub fn stop(&mut self) {
        if self.next_due.take().is_some() {
            log::debug!("Cadence stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// True when a tick is due; schedules the following one.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                let mut next = due + self.interval;
                if next <= now {
                    next = now + self.interval;
                }
                self.next_due = Some(next);
                true
            }
            _ => false,
        }
    }

    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}
