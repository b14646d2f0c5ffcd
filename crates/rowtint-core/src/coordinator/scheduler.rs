//! Deadline bookkeeping for the coordinator.
//!
//! None of these sleep. They only remember when something is due; the driver
//! sleeps until the earliest deadline and hands the current time back.

use std::time::Duration;

use tokio::time::Instant;

/// Trailing-edge debounce: fires once a quiet period has passed since the
/// last touch. A touch always replaces the pending deadline.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    /// Creates an idle debouncer.
    #[must_use]
    pub const fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Records activity at `now`, pushing the deadline out.
    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    /// Returns the pending deadline.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` and disarms if the deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        fire(&mut self.deadline, now)
    }

    /// Drops the pending deadline.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// A one-shot deadline. Scheduling again replaces it.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    /// Creates a disarmed timer.
    #[must_use]
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Arms the timer for `at`.
    pub fn schedule(&mut self, at: Instant) {
        self.deadline = Some(at);
    }

    /// Returns the pending deadline.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` and disarms if the deadline has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        fire(&mut self.deadline, now)
    }

    /// Disarms the timer.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// A repeating deadline. Missed periods are not made up.
#[derive(Debug, Clone)]
pub struct Interval {
    period: Duration,
    next: Option<Instant>,
}

impl Interval {
    /// Creates a stopped interval.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self { period, next: None }
    }

    /// Starts ticking one period after `now`.
    pub fn start(&mut self, now: Instant) {
        self.next = Some(now + self.period);
    }

    /// Stops ticking.
    pub fn stop(&mut self) {
        self.next = None;
    }

    /// Returns the next tick.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.next
    }

    /// Returns `true` and schedules the next tick if one is due.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.next {
            Some(next) if now >= next => {
                self.next = Some(now + self.period);
                true
            }
            _ => false,
        }
    }
}

fn fire(deadline: &mut Option<Instant>, now: Instant) -> bool {
    match *deadline {
        Some(at) if now >= at => {
            *deadline = None;
            true
        }
        _ => false,
    }
}
