//! Patient flow handler
//!
//! Business logic of a patient's path through the facility:
//!
//! ```text
//! arrival ──policy──▶ admit ──LOS──▶ discharge ──▶ outcome
//!            │
//!            └──────▶ decline ─────────────────▶ outcome
//! ```
//!
//! Admit and decline are raised with `trigger`, so every handler sees them at
//! the arrival instant. The discharge is scheduled `length_of_stay` after
//! admission. Each arrival turn pulls and schedules exactly one further
//! arrival from the source.

use crate::arrivals::{PatientArrival, PatientArrivalSource};
use crate::events::handler::{Context, Handler, HandlerResult};
use crate::events::types::{EventKind, PatientOutcome};
use crate::models::patient::PatientId;
use crate::policy::{ArrivalAssignment, HospitalPolicy};
use crate::stochastic::StochasticOutcomeModel;
use serde::Serialize;
use std::rc::Rc;
use tracing::debug;

/// Patient counts accumulated by [`PatientFlowHandler`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlowStats {
    pub arrivals: u64,
    pub admitted: u64,
    pub declined: u64,
    pub discharged: u64,
    /// Arrivals dropped because their id was already known
    pub rejected_duplicates: u64,
}

pub struct PatientFlowHandler {
    policy: Rc<dyn HospitalPolicy>,
    arrivals: Box<dyn PatientArrivalSource>,
    model: Box<dyn StochasticOutcomeModel>,
    stats: FlowStats,
}

impl PatientFlowHandler {
    pub fn new(
        policy: Rc<dyn HospitalPolicy>,
        arrivals: Box<dyn PatientArrivalSource>,
        model: Box<dyn StochasticOutcomeModel>,
    ) -> Self {
        Self {
            policy,
            arrivals,
            model,
            stats: FlowStats::default(),
        }
    }

    /// Pull the first arrival so the caller can schedule it
    pub fn first_arrival(&mut self) -> Option<PatientArrival> {
        self.arrivals.next_arrival()
    }

    pub fn stats(&self) -> FlowStats {
        self.stats
    }

    fn schedule_next_arrival(&mut self, ctx: &mut Context<'_>) -> HandlerResult {
        if let Some(next) = self.arrivals.next_arrival() {
            ctx.schedule(next.time, EventKind::Arrival(next))?;
        }
        Ok(())
    }
}

impl Handler for PatientFlowHandler {
    fn name(&self) -> &'static str {
        "patient_flow"
    }

    fn on_arrival(&mut self, ctx: &mut Context<'_>, arrival: &PatientArrival) -> HandlerResult {
        self.stats.arrivals += 1;
        let patient = arrival.patient;

        match ctx.state_mut().patients.add(patient, arrival.status) {
            Ok(()) => match self.policy.arrival_assignment(arrival, ctx.state()) {
                Some(assignment) => ctx.trigger(EventKind::Admit {
                    patient,
                    assignment,
                }),
                None => ctx.trigger(EventKind::Decline(patient)),
            },
            // the existing record stays; the next arrival is still pulled
            Err(anomaly) => {
                self.stats.rejected_duplicates += 1;
                ctx.report(anomaly);
            }
        }

        self.schedule_next_arrival(ctx)
    }

    fn on_admit(
        &mut self,
        ctx: &mut Context<'_>,
        patient: PatientId,
        assignment: &ArrivalAssignment,
    ) -> HandlerResult {
        let status = *ctx.state().patients.get(patient)?;

        let resources = &mut ctx.state_mut().resources;
        if assignment.given_bed {
            resources.beds.assign(patient);
            if assignment.given_ventilator && status.requires_vent {
                resources.ventilators.assign(patient);
            }
        }

        let stay = self.model.length_of_stay(&status).max(0.0);
        let discharge_at = ctx.now() + stay;
        ctx.schedule(discharge_at, EventKind::Discharge(patient))?;
        self.stats.admitted += 1;
        Ok(())
    }

    fn on_decline(&mut self, ctx: &mut Context<'_>, patient: PatientId) -> HandlerResult {
        let status = ctx.state_mut().patients.remove(patient)?;
        let outcome = self.model.declined_outcome(&status);
        self.stats.declined += 1;

        ctx.trigger(EventKind::Outcome(PatientOutcome {
            patient,
            outcome,
            admitted: false,
        }));
        Ok(())
    }

    fn on_discharge(&mut self, ctx: &mut Context<'_>, patient: PatientId) -> HandlerResult {
        if ctx.state().patients.has_exited(patient) {
            debug!(time = ctx.now(), %patient, "stale discharge ignored");
            return Ok(());
        }
        let status = *ctx.state().patients.get(patient)?;
        let outcome = self.model.admitted_outcome(&status);

        let resources = &mut ctx.state_mut().resources;
        resources.beds.release(patient, true)?;
        resources.ventilators.release(patient, false)?;
        ctx.state_mut().patients.remove(patient)?;
        self.stats.discharged += 1;

        ctx.trigger(EventKind::Outcome(PatientOutcome {
            patient,
            outcome,
            admitted: true,
        }));
        Ok(())
    }
}
