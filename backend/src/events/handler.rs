//! Handler capabilities and per-event dispatch
//!
//! A [`Handler`] reacts to any subset of the event kinds; every capability
//! defaults to a no-op. The kernel offers each event to all registered
//! handlers in registration order, passing a [`Context`] through which the
//! handler reads and mutates shared state and schedules follow-on work.
//!
//! # Results
//!
//! - `Ok(())`: continue
//! - `Err(SimulationError::Anomaly(_))`: recorded, run continues
//! - any other error: the run aborts
//!
//! # Cascades
//!
//! [`Context::trigger`] never re-enters dispatch. The event is queued on the
//! current instant's cascade FIFO and offered to every handler once the
//! current event has been offered to all of them.

use crate::arrivals::PatientArrival;
use crate::core::queue::EventQueue;
use crate::core::time::SimTime;
use crate::events::types::{EventKind, PatientOutcome};
use crate::models::error::Anomaly;
use crate::models::patient::PatientId;
use crate::models::ppe::Ppe;
use crate::models::staff::{ShiftType, StaffId};
use crate::models::state::HospitalState;
use crate::orchestrator::kernel::SimulationError;
use crate::policy::ArrivalAssignment;
use serde::Serialize;
use std::any::Any;
use std::collections::VecDeque;
use tracing::warn;

/// Result of one handler capability
pub type HandlerResult = Result<(), SimulationError>;

/// Anomaly recorded by the kernel, with where and when it happened
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    pub time: SimTime,
    pub event: &'static str,
    pub anomaly: Anomaly,
}

/// Downcast support for registered handlers
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Kernel services available to a handler during its turn
pub struct Context<'a> {
    pub(crate) now: SimTime,
    pub(crate) event: &'static str,
    pub(crate) queue: &'a mut EventQueue,
    pub(crate) cascade: &'a mut VecDeque<EventKind>,
    pub(crate) state: &'a mut HospitalState,
    pub(crate) anomalies: &'a mut Vec<AnomalyRecord>,
}

impl<'a> Context<'a> {
    /// Current simulated time
    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn state(&self) -> &HospitalState {
        &*self.state
    }

    pub fn state_mut(&mut self) -> &mut HospitalState {
        &mut *self.state
    }

    /// Enqueue `kind` at `time`
    ///
    /// Fails with [`SimulationError::InvalidTime`] if `time` is not finite or
    /// lies before the current time.
    pub fn schedule(&mut self, time: SimTime, kind: EventKind) -> Result<u64, SimulationError> {
        if !time.is_finite() || time < self.now {
            return Err(SimulationError::InvalidTime {
                time,
                now: self.now,
            });
        }
        Ok(self.queue.push(time, kind))
    }

    /// Raise `kind` at the current instant
    ///
    /// Dispatch is breadth-first, not nested: `kind` reaches the handlers only
    /// after the current event has been offered to every remaining handler,
    /// and after any event triggered earlier in the same instant. A handler
    /// registered after the caller therefore sees the current event before
    /// the triggered one.
    pub fn trigger(&mut self, kind: EventKind) {
        self.cascade.push_back(kind);
    }

    /// Record a recoverable anomaly and keep going
    pub fn report(&mut self, anomaly: Anomaly) {
        warn!(time = self.now, event = self.event, %anomaly, "anomaly");
        self.anomalies.push(AnomalyRecord {
            time: self.now,
            event: self.event,
            anomaly,
        });
    }
}

/// Observer/mutator of kernel events
pub trait Handler: AsAny {
    /// Name used in logs
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn on_arrival(&mut self, _ctx: &mut Context<'_>, _arrival: &PatientArrival) -> HandlerResult {
        Ok(())
    }

    fn on_admit(
        &mut self,
        _ctx: &mut Context<'_>,
        _patient: PatientId,
        _assignment: &ArrivalAssignment,
    ) -> HandlerResult {
        Ok(())
    }

    fn on_decline(&mut self, _ctx: &mut Context<'_>, _patient: PatientId) -> HandlerResult {
        Ok(())
    }

    fn on_discharge(&mut self, _ctx: &mut Context<'_>, _patient: PatientId) -> HandlerResult {
        Ok(())
    }

    fn on_staff_assigned(
        &mut self,
        _ctx: &mut Context<'_>,
        _patient: PatientId,
        _staff: StaffId,
    ) -> HandlerResult {
        Ok(())
    }

    fn on_staff_off(&mut self, _ctx: &mut Context<'_>, _staff: StaffId) -> HandlerResult {
        Ok(())
    }

    fn on_staff_available(&mut self, _ctx: &mut Context<'_>, _staff: StaffId) -> HandlerResult {
        Ok(())
    }

    fn on_shift_start(
        &mut self,
        _ctx: &mut Context<'_>,
        _staff: StaffId,
        _shift_type: ShiftType,
        _end_of_shift: SimTime,
        _ppe: Ppe,
    ) -> HandlerResult {
        Ok(())
    }

    fn on_outcome(&mut self, _ctx: &mut Context<'_>, _outcome: &PatientOutcome) -> HandlerResult {
        Ok(())
    }
}

/// Route `kind` to the matching capability of `handler`
pub fn dispatch(handler: &mut dyn Handler, ctx: &mut Context<'_>, kind: &EventKind) -> HandlerResult {
    match kind {
        EventKind::Arrival(arrival) => handler.on_arrival(ctx, arrival),
        EventKind::Admit {
            patient,
            assignment,
        } => handler.on_admit(ctx, *patient, assignment),
        EventKind::Decline(patient) => handler.on_decline(ctx, *patient),
        EventKind::Discharge(patient) => handler.on_discharge(ctx, *patient),
        EventKind::StaffAssigned { patient, staff } => {
            handler.on_staff_assigned(ctx, *patient, *staff)
        }
        EventKind::StaffOff(staff) => handler.on_staff_off(ctx, *staff),
        EventKind::StaffAvailable(staff) => handler.on_staff_available(ctx, *staff),
        EventKind::ShiftStart {
            staff,
            shift_type,
            end_of_shift,
            ppe,
        } => handler.on_shift_start(ctx, *staff, *shift_type, *end_of_shift, *ppe),
        EventKind::Outcome(outcome) => handler.on_outcome(ctx, outcome),
    }
}
