//! Least-Busy Staffing Policy
//!
//! Routes each arrival to the active staff member with the fewest patients,
//! subject to a per-staff cap, and restaffs at end of shift.
//!
//! # Arrival routing
//!
//! Admit iff a bed (and, when required, a ventilator) is free and the least
//! busy active member holds fewer than `max_patients`. Ties go to the lowest
//! staff id.
//!
//! # End-of-shift restaffing
//!
//! 1. If any staff member is AVAILABLE, the most rested one starts a new
//!    shift ending at `time + shift_length` and takes every orphan. This
//!    happens even when the leaving member had no patients. The cap is not
//!    applied here. The new shift gets full PPE while the facility has stock
//!    left, and none otherwise.
//! 2. Otherwise orphans (ascending id) are spread greedily over active staff
//!    with spare capacity: each step gives one orphan to the member with the
//!    most remaining capacity (lowest id on ties). Orphans left when capacity
//!    runs out stay unassigned.

use super::{ArrivalAssignment, HospitalPolicy, Reassignment, StaffOptions};
use crate::arrivals::PatientArrival;
use crate::core::time::SimTime;
use crate::models::patient::PatientId;
use crate::models::ppe::Ppe;
use crate::models::staff::{ShiftType, StaffId};
use crate::models::state::HospitalState;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeastBusy {
    /// Maximum patients per staff member at admission time
    pub max_patients: usize,
    /// Length of a shift started by restaffing
    pub shift_length: SimTime,
    /// Shift type given to restaffed members
    pub shift_type: ShiftType,
}

impl LeastBusy {
    pub fn new(max_patients: usize, shift_length: SimTime) -> Self {
        Self {
            max_patients,
            shift_length,
            shift_type: ShiftType::Day,
        }
    }

    pub fn with_shift_type(mut self, shift_type: ShiftType) -> Self {
        self.shift_type = shift_type;
        self
    }

    fn spread_over_active(
        &self,
        orphaned_patients: &BTreeSet<PatientId>,
        state: &HospitalState,
    ) -> BTreeMap<PatientId, StaffId> {
        let mut spare: BTreeMap<StaffId, usize> = state
            .staff
            .active_staff()
            .into_iter()
            .filter_map(|sid| {
                let load = state.staff.load(sid);
                (load < self.max_patients).then(|| (sid, self.max_patients - load))
            })
            .collect();

        let mut new_assignments = BTreeMap::new();
        for pid in orphaned_patients {
            // Most remaining capacity first; BTreeMap order makes the lowest id win ties
            let next = spare
                .iter()
                .filter(|(_, remaining)| **remaining > 0)
                .max_by(|(a_id, a), (b_id, b)| a.cmp(b).then(b_id.cmp(a_id)))
                .map(|(sid, _)| *sid);

            let Some(sid) = next else {
                break;
            };
            new_assignments.insert(*pid, sid);
            if let Some(remaining) = spare.get_mut(&sid) {
                *remaining -= 1;
            }
        }
        new_assignments
    }
}

impl HospitalPolicy for LeastBusy {
    fn name(&self) -> &'static str {
        "least_busy"
    }

    fn arrival_assignment(
        &self,
        arrival: &PatientArrival,
        state: &HospitalState,
    ) -> Option<ArrivalAssignment> {
        let resources = &state.resources;
        if !resources.bed_available() {
            return None;
        }
        let needs_ventilator = arrival.status.requires_vent;
        if needs_ventilator && !resources.vent_available() {
            return None;
        }

        let least_busy = state.staff.least_busy()?;
        if state.staff.load(least_busy) >= self.max_patients {
            return None;
        }

        Some(ArrivalAssignment::resources_only(needs_ventilator).with_staff(least_busy))
    }

    fn eos_restaff(
        &self,
        time: SimTime,
        orphaned_patients: &BTreeSet<PatientId>,
        state: &HospitalState,
    ) -> Reassignment {
        match state.staff.most_rested() {
            Some(rested) => {
                let mut added_staff = BTreeMap::new();
                added_staff.insert(
                    rested,
                    StaffOptions {
                        shift_type: self.shift_type,
                        shift_end: time + self.shift_length,
                        ppe: if state.ppe.has_stock() {
                            Ppe::FullPpe
                        } else {
                            Ppe::NoPpe
                        },
                    },
                );
                Reassignment {
                    added_staff,
                    new_assignments: orphaned_patients.iter().map(|pid| (*pid, rested)).collect(),
                }
            }
            None => Reassignment {
                added_staff: BTreeMap::new(),
                new_assignments: self.spread_over_active(orphaned_patients, state),
            },
        }
    }
}
