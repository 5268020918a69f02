//! Patient arrival sources
//!
//! An arrival source is a lazy, time-ordered sequence of [`PatientArrival`]s.
//! The flow handler pulls one arrival per arrival turn and schedules it, so at
//! most one future arrival is ever pending in the queue.
//!
//! # Key Principles
//!
//! 1. **Ordering**: arrivals come out in nondecreasing time order
//! 2. **Laziness**: sources may be infinite; nothing is generated ahead
//! 3. **Determinism**: a generated source with the same model seed yields the
//!    same trace
//!
//! # Example
//!
//! ```
//! use hospital_sim_core::arrivals::{PatientArrivalSource, ScriptedArrivals};
//! use hospital_sim_core::{PatientArrival, PatientId, PatientStatus};
//!
//! let mut source = ScriptedArrivals::new(vec![
//!     PatientArrival::new(5.0, PatientId(2), PatientStatus::ventilated()),
//!     PatientArrival::new(1.0, PatientId(1), PatientStatus::ventilated()),
//! ]);
//!
//! assert_eq!(source.next_arrival().unwrap().patient, PatientId(1));
//! assert_eq!(source.next_arrival().unwrap().patient, PatientId(2));
//! assert!(source.next_arrival().is_none());
//! ```

use crate::core::time::SimTime;
use crate::models::patient::{PatientId, PatientStatus};
use crate::stochastic::StochasticOutcomeModel;
use serde::{Deserialize, Serialize};

/// One patient showing up at the facility
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientArrival {
    pub time: SimTime,
    pub patient: PatientId,
    pub status: PatientStatus,
}

impl PatientArrival {
    pub fn new(time: SimTime, patient: PatientId, status: PatientStatus) -> Self {
        Self {
            time,
            patient,
            status,
        }
    }
}

/// Ordered, non-restartable stream of arrivals
pub trait PatientArrivalSource {
    /// Next arrival, or `None` once the source is exhausted
    fn next_arrival(&mut self) -> Option<PatientArrival>;
}

impl<I> PatientArrivalSource for I
where
    I: Iterator<Item = PatientArrival>,
{
    fn next_arrival(&mut self) -> Option<PatientArrival> {
        self.next()
    }
}

/// Finite, pre-recorded arrival trace
///
/// Arrivals are sorted by time on construction; arrivals sharing a time keep
/// their given order.
#[derive(Debug, Clone)]
pub struct ScriptedArrivals {
    arrivals: std::vec::IntoIter<PatientArrival>,
}

impl ScriptedArrivals {
    pub fn new(mut arrivals: Vec<PatientArrival>) -> Self {
        arrivals.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self {
            arrivals: arrivals.into_iter(),
        }
    }

    /// Arrivals at the given times with sequential ids starting at 1
    pub fn at_times(times: &[SimTime], status: PatientStatus) -> Self {
        Self::new(
            times
                .iter()
                .zip(1u64..)
                .map(|(time, id)| PatientArrival::new(*time, PatientId(id), status))
                .collect(),
        )
    }

    /// Arrivals not yet handed out
    pub fn remaining(&self) -> usize {
        self.arrivals.len()
    }
}

impl Iterator for ScriptedArrivals {
    type Item = PatientArrival;

    fn next(&mut self) -> Option<PatientArrival> {
        self.arrivals.next()
    }
}

/// Arrivals drawn from a [`StochasticOutcomeModel`]
///
/// Each arrival comes `next_interarrival(previous_time)` after the previous
/// one, carries the model's `draw_status()`, and gets the next sequential id.
/// Infinite unless a limit is set.
#[derive(Debug, Clone)]
pub struct GeneratedArrivals<M> {
    model: M,
    last_time: SimTime,
    next_id: u64,
    remaining: Option<usize>,
}

impl<M: StochasticOutcomeModel> GeneratedArrivals<M> {
    /// First arrival one gap after `start`; ids start at 1
    pub fn new(model: M, start: SimTime) -> Self {
        Self {
            model,
            last_time: start,
            next_id: 1,
            remaining: None,
        }
    }

    /// Stop after `limit` arrivals
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.remaining = Some(limit);
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: StochasticOutcomeModel> Iterator for GeneratedArrivals<M> {
    type Item = PatientArrival;

    fn next(&mut self) -> Option<PatientArrival> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }

        let gap = self.model.next_interarrival(self.last_time).max(0.0);
        let time = self.last_time + gap;
        let patient = PatientId(self.next_id);
        let status = self.model.draw_status();

        self.last_time = time;
        self.next_id += 1;
        Some(PatientArrival::new(time, patient, status))
    }
}
