//! Hospital State
//!
//! Aggregates everything handlers mutate and policies read: the patient
//! registry, bed and ventilator pools, the staff force and the PPE stock.
//!
//! # Critical Invariants
//!
//! 1. **Capacity**: `|holders| <= capacity` for beds and ventilators
//! 2. **Assignment Symmetry**: staff→patients mirrors patients→staff
//! 3. **Patient Uniqueness**: a patient id is present at most once

use crate::models::error::ConsistencyError;
use crate::models::patient::PatientState;
use crate::models::ppe::PpeStock;
use crate::models::resource::ResourceState;
use crate::models::staff::StaffForce;

/// Complete mutable state of a facility run
///
/// # Example
///
/// ```rust
/// use hospital_sim_core::{HospitalState, StaffForce, StaffId};
///
/// let state = HospitalState::new(10, 4, StaffForce::with_available([StaffId(1)]));
/// assert_eq!(state.resources.beds.capacity(), 10);
/// assert_eq!(state.staff.available_staff(), vec![StaffId(1)]);
/// assert!(state.verify_invariants().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct HospitalState {
    pub patients: PatientState,
    pub resources: ResourceState,
    pub staff: StaffForce,
    pub ppe: PpeStock,
}

impl HospitalState {
    pub fn new(beds: usize, ventilators: usize, staff: StaffForce) -> Self {
        Self {
            patients: PatientState::new(),
            resources: ResourceState::new(beds, ventilators),
            staff,
            ppe: PpeStock::default(),
        }
    }

    /// Start with `level` units of PPE in stock
    pub fn with_ppe(mut self, level: u64) -> Self {
        self.ppe = PpeStock::new(level);
        self
    }

    /// Facility without a staffing model
    pub fn without_staff(beds: usize, ventilators: usize) -> Self {
        Self::new(beds, ventilators, StaffForce::new())
    }

    /// Number of patients currently present
    pub fn census(&self) -> usize {
        self.patients.len()
    }

    /// Check capacity and assignment-symmetry invariants
    pub fn verify_invariants(&self) -> Result<(), ConsistencyError> {
        self.resources.verify_capacity()?;
        self.staff.verify_symmetry()
    }
}
