//! Domain event log for auditing and analysis.
//!
//! The kernel's queue holds *work*; this log holds *what happened*. Observer
//! handlers append one [`Event`] per domain transition so that a run can be
//! replayed, debugged, or exported for analysis.
//!
//! # Event Types
//!
//! - **Patient flow**: arrival, admit, decline, discharge, outcome
//! - **Staffing**: staff assignment, shift start, shift end, staff available
//!
//! # Example
//!
//! ```rust
//! use hospital_sim_core::models::{Event, EventLog};
//! use hospital_sim_core::PatientId;
//!
//! let mut log = EventLog::new();
//! log.log(Event::Decline { time: 12.5, patient: PatientId(4) });
//!
//! assert_eq!(log.events_for_patient(PatientId(4)).len(), 1);
//! assert_eq!(log.events()[0].event_type(), "Decline");
//! ```

use crate::core::time::SimTime;
use crate::models::patient::{Outcome, PatientId, Severity};
use crate::models::ppe::Ppe;
use crate::models::staff::{ShiftType, StaffId};
use serde::Serialize;

/// Serialize rows as one JSON object per line
pub fn to_json_lines<T: Serialize>(rows: &[T]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&serde_json::to_string(row)?);
        out.push('\n');
    }
    Ok(out)
}

/// Simulation event capturing a state change.
///
/// All events carry the simulated time at which they occurred and are logged
/// in dispatch order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Patient presented at the facility
    Arrival {
        time: SimTime,
        patient: PatientId,
        severity: Severity,
        requires_vent: bool,
    },

    /// Patient admitted, with the resources granted
    Admit {
        time: SimTime,
        patient: PatientId,
        bed: bool,
        ventilator: bool,
    },

    /// Patient turned away
    Decline { time: SimTime, patient: PatientId },

    /// Staff member took over care of a patient
    StaffAssigned {
        time: SimTime,
        patient: PatientId,
        staff: StaffId,
    },

    /// Patient left after their length of stay
    Discharge { time: SimTime, patient: PatientId },

    /// Staff member started a shift
    ShiftStart {
        time: SimTime,
        staff: StaffId,
        shift_type: ShiftType,
        end_of_shift: SimTime,
        ppe: Ppe,
    },

    /// Staff member went off shift
    ShiftEnd { time: SimTime, staff: StaffId },

    /// Staff member finished their rest period
    StaffAvailable { time: SimTime, staff: StaffId },

    /// Terminal outcome for a patient
    Outcome {
        time: SimTime,
        patient: PatientId,
        outcome: Outcome,
        admitted: bool,
    },
}

impl Event {
    /// Simulated time when this event occurred
    pub fn time(&self) -> SimTime {
        match self {
            Event::Arrival { time, .. } => *time,
            Event::Admit { time, .. } => *time,
            Event::Decline { time, .. } => *time,
            Event::StaffAssigned { time, .. } => *time,
            Event::Discharge { time, .. } => *time,
            Event::ShiftStart { time, .. } => *time,
            Event::ShiftEnd { time, .. } => *time,
            Event::StaffAvailable { time, .. } => *time,
            Event::Outcome { time, .. } => *time,
        }
    }

    /// Short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Arrival { .. } => "Arrival",
            Event::Admit { .. } => "Admit",
            Event::Decline { .. } => "Decline",
            Event::StaffAssigned { .. } => "StaffAssigned",
            Event::Discharge { .. } => "Discharge",
            Event::ShiftStart { .. } => "ShiftStart",
            Event::ShiftEnd { .. } => "ShiftEnd",
            Event::StaffAvailable { .. } => "StaffAvailable",
            Event::Outcome { .. } => "Outcome",
        }
    }

    /// Patient ID if the event relates to a specific patient
    pub fn patient(&self) -> Option<PatientId> {
        match self {
            Event::Arrival { patient, .. }
            | Event::Admit { patient, .. }
            | Event::Decline { patient, .. }
            | Event::StaffAssigned { patient, .. }
            | Event::Discharge { patient, .. }
            | Event::Outcome { patient, .. } => Some(*patient),
            _ => None,
        }
    }

    /// Staff ID if the event relates to a specific staff member
    pub fn staff(&self) -> Option<StaffId> {
        match self {
            Event::StaffAssigned { staff, .. }
            | Event::ShiftStart { staff, .. }
            | Event::ShiftEnd { staff, .. }
            | Event::StaffAvailable { staff, .. } => Some(*staff),
            _ => None,
        }
    }
}

/// Event log for storing and querying simulation events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events of a specific type, e.g. `"Admit"`
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_patient(&self, patient: PatientId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.patient() == Some(patient))
            .collect()
    }

    pub fn events_for_staff(&self, staff: StaffId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.staff() == Some(staff))
            .collect()
    }

    /// Events with `from <= time < to`
    pub fn events_between(&self, from: SimTime, to: SimTime) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.time() >= from && e.time() < to)
            .collect()
    }

    /// One JSON object per line, in log order
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        to_json_lines(&self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
