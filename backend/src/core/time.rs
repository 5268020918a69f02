//! Simulated clock
//!
//! The simulation runs on a single continuous timeline measured in minutes.
//! The clock only moves forward, and only when the kernel pops an event.

use serde::{Deserialize, Serialize};

/// Simulated timestamp, in minutes since the start of the run.
pub type SimTime = f64;

/// Minutes in one simulated day
pub const MINUTES_PER_DAY: SimTime = 60.0 * 24.0;

/// Monotonic simulated clock
///
/// # Example
/// ```
/// use hospital_sim_core::SimClock;
///
/// let mut clock = SimClock::new();
/// assert_eq!(clock.now(), 0.0);
///
/// clock.advance_to(90.0);
/// assert_eq!(clock.now(), 90.0);
/// assert_eq!(clock.current_day(), 0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimClock {
    now: SimTime,
}

impl SimClock {
    /// Create a clock positioned at t=0
    pub fn new() -> Self {
        Self { now: 0.0 }
    }

    /// Create a clock positioned at `start`
    ///
    /// # Panics
    /// Panics if `start` is negative or not finite
    pub fn starting_at(start: SimTime) -> Self {
        assert!(
            start.is_finite() && start >= 0.0,
            "clock start must be finite and non-negative"
        );
        Self { now: start }
    }

    /// Move the clock forward to `time`
    ///
    /// # Panics
    /// Panics if `time` is earlier than the current time. The kernel never
    /// pops an event from the past, so this signals a queue ordering bug.
    pub fn advance_to(&mut self, time: SimTime) {
        assert!(
            time >= self.now,
            "clock cannot move backwards (now={}, requested={})",
            self.now,
            time
        );
        self.now = time;
    }

    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Current day (0-indexed)
    ///
    /// # Example
    /// ```
    /// use hospital_sim_core::{SimClock, MINUTES_PER_DAY};
    ///
    /// let mut clock = SimClock::new();
    /// clock.advance_to(MINUTES_PER_DAY * 2.5);
    /// assert_eq!(clock.current_day(), 2);
    /// ```
    pub fn current_day(&self) -> usize {
        (self.now / MINUTES_PER_DAY) as usize
    }

    /// Minutes elapsed within the current day
    pub fn minute_of_day(&self) -> SimTime {
        self.now % MINUTES_PER_DAY
    }

    /// Whether `time` is a legal scheduling target from this clock's position
    pub fn accepts(&self, time: SimTime) -> bool {
        time.is_finite() && time >= self.now
    }
}
