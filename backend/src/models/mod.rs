//! Domain models for the facility simulator

pub mod error;
pub mod event;
pub mod patient;
pub mod ppe;
pub mod resource;
pub mod staff;
pub mod state;

pub use error::{Anomaly, ConsistencyError};
pub use event::{to_json_lines, Event, EventLog};
pub use patient::{Outcome, PatientId, PatientState, PatientStatus, Severity};
pub use ppe::{Ppe, PpeStock};
pub use resource::{ResourceKind, ResourcePool, ResourceState};
pub use staff::{ShiftType, StaffForce, StaffId, StaffRecord, StaffState};
pub use state::HospitalState;
