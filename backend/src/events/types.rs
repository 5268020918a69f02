//! Kernel event types
//!
//! [`EventKind`] is the closed set of things that can happen in a run. Each
//! variant carries a strongly typed payload, so handlers never parse
//! free-form data.
//!
//! # Design Principles
//!
//! 1. **Total order**: events compare by `(time, sequence_id)`
//! 2. **Single use**: an event is created by one `schedule`/`trigger` call and
//!    consumed by exactly one dispatch
//! 3. **Self-contained**: payloads carry everything handlers need

use crate::arrivals::PatientArrival;
use crate::core::time::SimTime;
use crate::models::patient::{Outcome, PatientId};
use crate::models::ppe::Ppe;
use crate::models::staff::{ShiftType, StaffId};
use crate::policy::ArrivalAssignment;
use std::cmp::Ordering;

/// Terminal result for one patient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatientOutcome {
    pub patient: PatientId,
    pub outcome: Outcome,
    /// Whether the patient was admitted before the outcome
    pub admitted: bool,
}

/// What an event means to the handlers
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// A patient shows up
    Arrival(PatientArrival),

    /// The policy admitted a patient with these grants
    Admit {
        patient: PatientId,
        assignment: ArrivalAssignment,
    },

    /// The policy declined a patient
    Decline(PatientId),

    /// An admitted patient's stay ends
    Discharge(PatientId),

    /// A staff member took over a patient, at admission or on restaffing
    StaffAssigned { patient: PatientId, staff: StaffId },

    /// A staff member's shift ends
    StaffOff(StaffId),

    /// A staff member's rest period ends
    StaffAvailable(StaffId),

    /// A staff member went on shift
    ShiftStart {
        staff: StaffId,
        shift_type: ShiftType,
        end_of_shift: SimTime,
        ppe: Ppe,
    },

    /// A patient left the system with a terminal outcome
    Outcome(PatientOutcome),
}

impl EventKind {
    /// Stable snake_case name, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Arrival(_) => "arrival",
            EventKind::Admit { .. } => "admit",
            EventKind::Decline(_) => "decline",
            EventKind::Discharge(_) => "discharge",
            EventKind::StaffAssigned { .. } => "staff_assigned",
            EventKind::StaffOff(_) => "staff_off",
            EventKind::StaffAvailable(_) => "staff_available",
            EventKind::ShiftStart { .. } => "shift_start",
            EventKind::Outcome(_) => "outcome",
        }
    }
}

/// Event waiting in the kernel queue
///
/// Ordered by `(time, sequence_id)` ascending. `BinaryHeap` is a max-heap,
/// so the queue wraps entries in [`std::cmp::Reverse`].
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub time: SimTime,
    pub sequence_id: u64,
    pub kind: EventKind,
}

impl ScheduledEvent {
    pub fn new(time: SimTime, sequence_id: u64, kind: EventKind) -> Self {
        Self {
            time,
            sequence_id,
            kind,
        }
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then(self.sequence_id.cmp(&other.sequence_id))
    }
}
