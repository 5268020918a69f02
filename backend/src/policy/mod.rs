//! Admission and Staffing Policy Module
//!
//! Policies are pure decision objects: they read a snapshot of the
//! [`HospitalState`] and return what *should* happen. Handlers apply the
//! decisions; a policy never mutates state.
//!
//! # Policy Interface
//!
//! All policies implement the `HospitalPolicy` trait:
//! ```rust
//! use hospital_sim_core::policy::{ArrivalAssignment, HospitalPolicy};
//! use hospital_sim_core::{HospitalState, PatientArrival};
//!
//! struct AdmitEveryone;
//!
//! impl HospitalPolicy for AdmitEveryone {
//!     fn name(&self) -> &'static str {
//!         "admit_everyone"
//!     }
//!
//!     fn arrival_assignment(
//!         &self,
//!         arrival: &PatientArrival,
//!         _state: &HospitalState,
//!     ) -> Option<ArrivalAssignment> {
//!         Some(ArrivalAssignment::resources_only(arrival.status.requires_vent))
//!     }
//! }
//! ```
//!
//! Available policies:
//! 1. **FirstComeFirstServed**: admit while bed/ventilator counts allow
//! 2. **LeastBusy**: route to the least loaded active staff member, restaff
//!    at end of shift
//! 3. **CriteriaPolicy**: wrap any [`AdmissionCriteria`], no staffing model
//!
//! # Resource coupling
//!
//! A ventilator is only ever granted together with a bed, and only to a
//! patient whose status requires one. [`ArrivalAssignment`] carries both
//! grants so the handler applies them in one step.

use crate::arrivals::PatientArrival;
use crate::core::time::SimTime;
use crate::models::patient::{PatientId, PatientStatus};
use crate::models::ppe::Ppe;
use crate::models::resource::ResourceState;
use crate::models::staff::{ShiftType, StaffId};
use crate::models::state::HospitalState;
use std::collections::{BTreeMap, BTreeSet};

pub mod fcfs;
pub mod least_busy;

pub use fcfs::FirstComeFirstServed;
pub use least_busy::LeastBusy;

/// Decision to admit an arrival
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrivalAssignment {
    pub given_bed: bool,
    pub given_ventilator: bool,
    /// Active staff members who take over care
    pub staff: BTreeSet<StaffId>,
}

impl ArrivalAssignment {
    /// Bed plus, when required, a ventilator; no staff
    pub fn resources_only(requires_vent: bool) -> Self {
        Self {
            given_bed: true,
            given_ventilator: requires_vent,
            staff: BTreeSet::new(),
        }
    }

    pub fn with_staff(mut self, staff: StaffId) -> Self {
        self.staff.insert(staff);
        self
    }
}

/// Parameters of a shift started by a policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaffOptions {
    pub shift_type: ShiftType,
    pub shift_end: SimTime,
    pub ppe: Ppe,
}

/// End-of-shift restaffing decision
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reassignment {
    /// AVAILABLE staff to bring onto a new shift
    pub added_staff: BTreeMap<StaffId, StaffOptions>,
    /// Orphaned patient → staff member taking over
    pub new_assignments: BTreeMap<PatientId, StaffId>,
}

impl Reassignment {
    pub fn is_empty(&self) -> bool {
        self.added_staff.is_empty() && self.new_assignments.is_empty()
    }
}

/// Facility-level admission and staffing strategy
pub trait HospitalPolicy {
    /// Policy identifier used in logs and reports
    fn name(&self) -> &'static str;

    /// Decide whether and how to admit an arrival
    ///
    /// `None` declines the patient.
    fn arrival_assignment(
        &self,
        arrival: &PatientArrival,
        state: &HospitalState,
    ) -> Option<ArrivalAssignment>;

    /// Decide who takes over the patients of a staff member leaving shift
    ///
    /// Called after the departing member is already UNAVAILABLE. Default:
    /// leave the orphans unassigned.
    fn eos_restaff(
        &self,
        _time: SimTime,
        _orphaned_patients: &BTreeSet<PatientId>,
        _state: &HospitalState,
    ) -> Reassignment {
        Reassignment::default()
    }
}

/// Stand-alone admission rule, evaluated once per arrival
pub trait AdmissionCriteria {
    fn decide_admit(&self, status: &PatientStatus, resources: &ResourceState) -> bool;
}

/// Admit iff a bed is free and, when needed, a ventilator is free
///
/// # Example
///
/// ```
/// use hospital_sim_core::policy::{AdmissionCriteria, BedAndVentilatorCriteria};
/// use hospital_sim_core::{PatientStatus, ResourceState};
///
/// let resources = ResourceState::new(1, 0);
/// let criteria = BedAndVentilatorCriteria;
///
/// assert!(!criteria.decide_admit(&PatientStatus::ventilated(), &resources));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BedAndVentilatorCriteria;

impl AdmissionCriteria for BedAndVentilatorCriteria {
    fn decide_admit(&self, status: &PatientStatus, resources: &ResourceState) -> bool {
        resources.bed_available() && (!status.requires_vent || resources.vent_available())
    }
}

/// Adapts an [`AdmissionCriteria`] into a [`HospitalPolicy`]
#[derive(Debug, Clone, Default)]
pub struct CriteriaPolicy<C> {
    criteria: C,
}

impl<C: AdmissionCriteria> CriteriaPolicy<C> {
    pub fn new(criteria: C) -> Self {
        Self { criteria }
    }
}

impl<C: AdmissionCriteria> HospitalPolicy for CriteriaPolicy<C> {
    fn name(&self) -> &'static str {
        "criteria"
    }

    fn arrival_assignment(
        &self,
        arrival: &PatientArrival,
        state: &HospitalState,
    ) -> Option<ArrivalAssignment> {
        self.criteria
            .decide_admit(&arrival.status, &state.resources)
            .then(|| ArrivalAssignment::resources_only(arrival.status.requires_vent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::patient::Severity;

    fn arrival(requires_vent: bool) -> PatientArrival {
        PatientArrival::new(0.0, PatientId(1), PatientStatus::new(Severity::Severe, requires_vent))
    }

    #[test]
    fn test_bed_and_vent_criteria() {
        let criteria = BedAndVentilatorCriteria;
        let mut resources = ResourceState::new(1, 1);

        assert!(criteria.decide_admit(&PatientStatus::ventilated(), &resources));

        resources.ventilators.assign(PatientId(9));
        assert!(!criteria.decide_admit(&PatientStatus::ventilated(), &resources));
        assert!(criteria.decide_admit(&PatientStatus::bed_only(Severity::Moderate), &resources));

        resources.beds.assign(PatientId(9));
        assert!(!criteria.decide_admit(&PatientStatus::bed_only(Severity::Moderate), &resources));
    }

    #[test]
    fn test_criteria_policy_grants_vent_only_when_required() {
        let policy = CriteriaPolicy::new(BedAndVentilatorCriteria);
        let state = HospitalState::without_staff(2, 2);

        let bed_only = policy.arrival_assignment(&arrival(false), &state).unwrap();
        assert!(bed_only.given_bed);
        assert!(!bed_only.given_ventilator);

        let vented = policy.arrival_assignment(&arrival(true), &state).unwrap();
        assert!(vented.given_ventilator);
        assert!(vented.staff.is_empty());
    }

    #[test]
    fn test_default_restaff_is_empty() {
        let policy = CriteriaPolicy::new(BedAndVentilatorCriteria);
        let state = HospitalState::without_staff(1, 1);
        let orphans: BTreeSet<PatientId> = [PatientId(1)].into_iter().collect();

        assert!(policy.eos_restaff(10.0, &orphans, &state).is_empty());
    }
}
