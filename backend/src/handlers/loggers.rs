//! Observer handlers
//!
//! Loggers never mutate state and never fail. Each keeps its rows in memory;
//! rows serialize with serde and export as JSON lines. Writing them to disk
//! is left to the caller.

use crate::arrivals::PatientArrival;
use crate::core::time::SimTime;
use crate::events::handler::{Context, Handler, HandlerResult};
use crate::events::types::PatientOutcome;
use crate::models::event::{to_json_lines, Event, EventLog};
use crate::models::patient::{Outcome, PatientId, Severity};
use crate::models::ppe::Ppe;
use crate::models::staff::{ShiftType, StaffId};
use crate::policy::ArrivalAssignment;
use serde::Serialize;

// ============================================================================
// EventLogger
// ============================================================================

/// Records every domain transition into an [`EventLog`]
#[derive(Debug, Default)]
pub struct EventLogger {
    log: EventLog,
}

impl EventLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn into_log(self) -> EventLog {
        self.log
    }
}

impl Handler for EventLogger {
    fn name(&self) -> &'static str {
        "event_logger"
    }

    fn on_arrival(&mut self, ctx: &mut Context<'_>, arrival: &PatientArrival) -> HandlerResult {
        self.log.log(Event::Arrival {
            time: ctx.now(),
            patient: arrival.patient,
            severity: arrival.status.severity,
            requires_vent: arrival.status.requires_vent,
        });
        Ok(())
    }

    fn on_admit(
        &mut self,
        ctx: &mut Context<'_>,
        patient: PatientId,
        _assignment: &ArrivalAssignment,
    ) -> HandlerResult {
        self.log.log(Event::Admit {
            time: ctx.now(),
            patient,
            bed: ctx.state().resources.beds.holds(patient),
            ventilator: ctx.state().resources.ventilators.holds(patient),
        });
        Ok(())
    }

    fn on_decline(&mut self, ctx: &mut Context<'_>, patient: PatientId) -> HandlerResult {
        self.log.log(Event::Decline {
            time: ctx.now(),
            patient,
        });
        Ok(())
    }

    fn on_discharge(&mut self, ctx: &mut Context<'_>, patient: PatientId) -> HandlerResult {
        self.log.log(Event::Discharge {
            time: ctx.now(),
            patient,
        });
        Ok(())
    }

    fn on_staff_assigned(
        &mut self,
        ctx: &mut Context<'_>,
        patient: PatientId,
        staff: StaffId,
    ) -> HandlerResult {
        self.log.log(Event::StaffAssigned {
            time: ctx.now(),
            patient,
            staff,
        });
        Ok(())
    }

    fn on_staff_off(&mut self, ctx: &mut Context<'_>, staff: StaffId) -> HandlerResult {
        self.log.log(Event::ShiftEnd {
            time: ctx.now(),
            staff,
        });
        Ok(())
    }

    fn on_staff_available(&mut self, ctx: &mut Context<'_>, staff: StaffId) -> HandlerResult {
        self.log.log(Event::StaffAvailable {
            time: ctx.now(),
            staff,
        });
        Ok(())
    }

    fn on_shift_start(
        &mut self,
        ctx: &mut Context<'_>,
        staff: StaffId,
        shift_type: ShiftType,
        end_of_shift: SimTime,
        ppe: Ppe,
    ) -> HandlerResult {
        self.log.log(Event::ShiftStart {
            time: ctx.now(),
            staff,
            shift_type,
            end_of_shift,
            ppe,
        });
        Ok(())
    }

    fn on_outcome(&mut self, ctx: &mut Context<'_>, outcome: &PatientOutcome) -> HandlerResult {
        self.log.log(Event::Outcome {
            time: ctx.now(),
            patient: outcome.patient,
            outcome: outcome.outcome,
            admitted: outcome.admitted,
        });
        Ok(())
    }
}

// ============================================================================
// PatientLogger
// ============================================================================

/// One row per arrival
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRow {
    pub patient: PatientId,
    pub time: SimTime,
    pub severity: Severity,
    pub needs_vent: bool,
}

/// Records the status of every arriving patient
#[derive(Debug, Default)]
pub struct PatientLogger {
    rows: Vec<PatientRow>,
}

impl PatientLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[PatientRow] {
        &self.rows
    }

    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        to_json_lines(&self.rows)
    }
}

impl Handler for PatientLogger {
    fn name(&self) -> &'static str {
        "patient_logger"
    }

    fn on_arrival(&mut self, ctx: &mut Context<'_>, arrival: &PatientArrival) -> HandlerResult {
        self.rows.push(PatientRow {
            patient: arrival.patient,
            time: ctx.now(),
            severity: arrival.status.severity,
            needs_vent: arrival.status.requires_vent,
        });
        Ok(())
    }
}

// ============================================================================
// OutcomeLogger
// ============================================================================

/// One row per terminal outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeRow {
    pub patient: PatientId,
    pub time: SimTime,
    pub outcome: Outcome,
    pub admitted: bool,
}

/// Records patient outcomes and keeps running totals
#[derive(Debug, Default)]
pub struct OutcomeLogger {
    rows: Vec<OutcomeRow>,
}

impl OutcomeLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[OutcomeRow] {
        &self.rows
    }

    fn count(&self, outcome: Outcome, admitted: Option<bool>) -> usize {
        self.rows
            .iter()
            .filter(|row| row.outcome == outcome)
            .filter(|row| admitted.map_or(true, |a| row.admitted == a))
            .count()
    }

    pub fn lives(&self) -> usize {
        self.count(Outcome::Lives, None)
    }

    pub fn deaths(&self) -> usize {
        self.count(Outcome::Dies, None)
    }

    /// Deaths among patients who were declined
    pub fn declined_deaths(&self) -> usize {
        self.count(Outcome::Dies, Some(false))
    }

    /// Deaths among patients who were admitted
    pub fn admitted_deaths(&self) -> usize {
        self.count(Outcome::Dies, Some(true))
    }

    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        to_json_lines(&self.rows)
    }
}

impl Handler for OutcomeLogger {
    fn name(&self) -> &'static str {
        "outcome_logger"
    }

    fn on_outcome(&mut self, ctx: &mut Context<'_>, outcome: &PatientOutcome) -> HandlerResult {
        self.rows.push(OutcomeRow {
            patient: outcome.patient,
            time: ctx.now(),
            outcome: outcome.outcome,
            admitted: outcome.admitted,
        });
        Ok(())
    }
}
