//! Error taxonomy for state operations
//!
//! Two kinds of failure exist at the state layer:
//!
//! - [`ConsistencyError`]: an invariant was violated. Always fatal; it means
//!   a handler or policy has a logic defect.
//! - [`Anomaly`]: a recoverable irregularity such as a duplicate or unknown
//!   patient id. The kernel records it and the run continues.

use crate::models::patient::PatientId;
use crate::models::resource::ResourceKind;
use crate::models::staff::{StaffId, StaffState};
use serde::Serialize;
use thiserror::Error;

/// Fatal invariant violation
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConsistencyError {
    #[error("Invalid transition for staff {staff}: cannot {action} from {from:?}")]
    InvalidTransition {
        staff: StaffId,
        from: StaffState,
        action: &'static str,
    },

    #[error("Staff {staff} is {state:?}; assignments require an active staff member")]
    StaffNotActive { staff: StaffId, state: StaffState },

    #[error("Unknown staff member {0}")]
    UnknownStaff(StaffId),

    #[error("Patient {patient} is not assigned to staff {staff}")]
    NotAssigned { staff: StaffId, patient: PatientId },

    #[error("Patient {patient} does not hold a {resource:?}")]
    ResourceNotHeld {
        resource: ResourceKind,
        patient: PatientId,
    },

    #[error("{resource:?} capacity exceeded: {holders} holders for capacity {capacity}")]
    CapacityExceeded {
        resource: ResourceKind,
        holders: usize,
        capacity: usize,
    },

    #[error("Assignment graph asymmetric between staff {staff} and patient {patient}")]
    AsymmetricAssignment { staff: StaffId, patient: PatientId },

    #[error("Cascade limit of {limit} same-instant events exceeded at t={time}")]
    CascadeOverflow { limit: usize, time: f64 },
}

/// Recoverable irregularity, reported but non-fatal
#[derive(Debug, Clone, Error, PartialEq, Serialize)]
pub enum Anomaly {
    #[error("Patient {0} already present")]
    DuplicatePatient(PatientId),

    #[error("Patient {0} is not present")]
    UnknownPatient(PatientId),

    #[error("Staff member {0} already registered")]
    DuplicateStaff(StaffId),

    #[error("No PPE left for the shift of staff member {0}")]
    PpeExhausted(StaffId),
}

impl Anomaly {
    /// Patient the anomaly concerns, if any
    pub fn patient(&self) -> Option<PatientId> {
        match self {
            Anomaly::DuplicatePatient(pid) | Anomaly::UnknownPatient(pid) => Some(*pid),
            Anomaly::DuplicateStaff(_) | Anomaly::PpeExhausted(_) => None,
        }
    }
}
