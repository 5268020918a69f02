//! Staffing handler
//!
//! Applies the staff side of every decision:
//!
//! - **Admit**: assign the admitted patient to the staff members the policy
//!   picked
//! - **Discharge**: tear down the patient's staff edges
//! - **Staff off**: end the shift, schedule the end of the rest period, ask
//!   the policy to restaff the orphans, then start the added shifts and apply
//!   the new assignments
//! - **Staff available**: end the rest period
//!
//! Every assignment is announced with a `StaffAssigned` cascade and every
//! shift started here with a `ShiftStart` cascade.
//!
//! A shift started with full PPE draws one unit from the facility stock. If
//! the stock ran dry, an `Anomaly::PpeExhausted` is recorded and the shift
//! starts without protection.

use crate::core::time::SimTime;
use crate::events::handler::{Context, Handler, HandlerResult};
use crate::events::types::EventKind;
use crate::models::patient::PatientId;
use crate::models::ppe::Ppe;
use crate::models::staff::{ShiftType, StaffId};
use crate::policy::{ArrivalAssignment, HospitalPolicy};
use std::rc::Rc;
use tracing::debug;

pub struct StaffingHandler {
    policy: Rc<dyn HospitalPolicy>,
    rest_period: SimTime,
}

impl StaffingHandler {
    /// `rest_period`: time between a shift's end and the member becoming
    /// available again
    pub fn new(policy: Rc<dyn HospitalPolicy>, rest_period: SimTime) -> Self {
        Self {
            policy,
            rest_period,
        }
    }

    pub fn rest_period(&self) -> SimTime {
        self.rest_period
    }

    fn assign(ctx: &mut Context<'_>, staff: StaffId, patient: PatientId) -> HandlerResult {
        if ctx.state_mut().staff.assign(staff, patient)? {
            ctx.trigger(EventKind::StaffAssigned { patient, staff });
        }
        Ok(())
    }

    /// Put an AVAILABLE member on shift until `end_of_shift`
    ///
    /// Schedules the matching `StaffOff` and announces the shift.
    fn start_shift(
        ctx: &mut Context<'_>,
        staff: StaffId,
        shift_type: ShiftType,
        end_of_shift: SimTime,
        ppe: Ppe,
    ) -> HandlerResult {
        ctx.state_mut()
            .staff
            .start_shift(staff, shift_type, end_of_shift)?;
        let ppe = match ctx.state_mut().ppe.consume(staff, ppe) {
            Ok(()) => ppe,
            Err(anomaly) => {
                ctx.report(anomaly);
                ctx.state_mut().ppe.issue()
            }
        };
        ctx.schedule(end_of_shift, EventKind::StaffOff(staff))?;
        ctx.trigger(EventKind::ShiftStart {
            staff,
            shift_type,
            end_of_shift,
            ppe,
        });
        Ok(())
    }
}

impl Handler for StaffingHandler {
    fn name(&self) -> &'static str {
        "staffing"
    }

    fn on_admit(
        &mut self,
        ctx: &mut Context<'_>,
        patient: PatientId,
        assignment: &ArrivalAssignment,
    ) -> HandlerResult {
        for staff in &assignment.staff {
            Self::assign(ctx, *staff, patient)?;
        }
        Ok(())
    }

    fn on_discharge(&mut self, ctx: &mut Context<'_>, patient: PatientId) -> HandlerResult {
        // empty for stale discharges and unstaffed patients
        ctx.state_mut().staff.remove_patient(patient)?;
        Ok(())
    }

    fn on_staff_off(&mut self, ctx: &mut Context<'_>, staff: StaffId) -> HandlerResult {
        let now = ctx.now();
        let orphans = ctx.state_mut().staff.make_unavailable(staff, now)?;
        ctx.schedule(now + self.rest_period, EventKind::StaffAvailable(staff))?;

        let decision = self.policy.eos_restaff(now, &orphans, ctx.state());
        debug!(
            time = now,
            %staff,
            orphans = orphans.len(),
            added = decision.added_staff.len(),
            reassigned = decision.new_assignments.len(),
            "end of shift"
        );

        for (added, options) in &decision.added_staff {
            Self::start_shift(ctx, *added, options.shift_type, options.shift_end, options.ppe)?;
        }
        for (patient, new_staff) in &decision.new_assignments {
            if !ctx.state().patients.contains(*patient) {
                continue;
            }
            Self::assign(ctx, *new_staff, *patient)?;
        }
        Ok(())
    }

    fn on_staff_available(&mut self, ctx: &mut Context<'_>, staff: StaffId) -> HandlerResult {
        ctx.state_mut().staff.make_available(staff)?;
        Ok(())
    }
}
