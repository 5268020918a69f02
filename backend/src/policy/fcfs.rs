//! FCFS (First-Come-First-Served) Policy
//!
//! Simplest baseline policy: admit every arrival while resource counts allow.
//!
//! # Behavior
//!
//! - Admits iff `num_beds_used < max_beds` and, for ventilator-dependent
//!   patients, `num_vented < max_ventilators`
//! - Grants a bed, plus a ventilator when required
//! - No staffing model: arrivals get no staff, shift ends are not restaffed
//!
//! # Use Case
//!
//! - Baseline for comparison with staffing-aware policies
//! - Capacity sweeps (ICU size vs. mortality)

use super::{ArrivalAssignment, HospitalPolicy};
use crate::arrivals::PatientArrival;
use crate::models::state::HospitalState;

/// FCFS policy with explicit caps
///
/// The caps are usually the pool capacities, but may be set lower to model
/// reserved units.
///
/// # Example
///
/// ```
/// use hospital_sim_core::policy::{FirstComeFirstServed, HospitalPolicy};
/// use hospital_sim_core::{HospitalState, PatientArrival, PatientId, PatientStatus};
///
/// let policy = FirstComeFirstServed::new(1, 1);
/// let state = HospitalState::without_staff(1, 1);
/// let arrival = PatientArrival::new(0.0, PatientId(1), PatientStatus::ventilated());
///
/// let assignment = policy.arrival_assignment(&arrival, &state).unwrap();
/// assert!(assignment.given_bed && assignment.given_ventilator);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstComeFirstServed {
    pub max_beds: usize,
    pub max_ventilators: usize,
}

impl FirstComeFirstServed {
    pub fn new(max_beds: usize, max_ventilators: usize) -> Self {
        Self {
            max_beds,
            max_ventilators,
        }
    }
}

impl HospitalPolicy for FirstComeFirstServed {
    fn name(&self) -> &'static str {
        "fcfs"
    }

    fn arrival_assignment(
        &self,
        arrival: &PatientArrival,
        state: &HospitalState,
    ) -> Option<ArrivalAssignment> {
        if state.resources.num_beds_used() >= self.max_beds {
            return None;
        }

        let needs_ventilator = arrival.status.requires_vent;
        if needs_ventilator && state.resources.num_vented() >= self.max_ventilators {
            return None;
        }

        Some(ArrivalAssignment::resources_only(needs_ventilator))
    }
}
