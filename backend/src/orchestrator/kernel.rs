//! Discrete-event scheduling kernel
//!
//! The kernel owns the clock, the pending-event queue, the hospital state and
//! the ordered handler list. `run` pops events in `(time, sequence_id)` order
//! and offers each one to every handler before popping the next.
//!
//! # Dispatch of one instant
//!
//! ```text
//! pop event ─▶ advance clock ─▶ offer to handler 1..n
//!                                   │ (trigger)
//!                                   ▼
//!                            cascade FIFO ─▶ offer each to handler 1..n
//!                                   │
//!                                   ▼
//!                          verify invariants ─▶ next pop
//! ```
//!
//! Cascades may raise further cascades; the FIFO drains in order and is
//! bounded by `cascade_limit` per instant.

use crate::core::queue::EventQueue;
use crate::core::time::{SimClock, SimTime};
use crate::events::handler::{dispatch, AnomalyRecord, Context, Handler};
use crate::events::types::{EventKind, ScheduledEvent};
use crate::models::error::{Anomaly, ConsistencyError};
use crate::models::state::HospitalState;
use serde::Serialize;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info};

/// Default bound on same-instant cascades
pub const DEFAULT_CASCADE_LIMIT: usize = 10_000;

/// Top-level simulation error
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulationError {
    /// Invariant violated; always fatal
    #[error("Consistency error: {0}")]
    Consistency(#[from] ConsistencyError),

    /// Recoverable irregularity raised by a handler
    #[error("Anomaly: {0}")]
    Anomaly(#[from] Anomaly),

    #[error("Invalid event time {time} (now={now})")]
    InvalidTime { time: SimTime, now: SimTime },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl SimulationError {
    /// Whether the error must abort the run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SimulationError::Anomaly(_))
    }
}

/// Why a call to [`Kernel::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    QueueEmpty,
    TimeLimit,
}

/// Result of one [`Kernel::run`] call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Queued (and externally triggered) events dispatched by this call
    pub events_dispatched: u64,
    /// Cascades dispatched by this call
    pub cascades_dispatched: u64,
    /// Anomalies recorded by this call
    pub anomalies: usize,
    /// Clock at the end of the call (time of the last dispatched event)
    pub final_time: SimTime,
    pub stop_reason: StopReason,
    /// Events still queued
    pub pending: usize,
}

/// Scheduling kernel
///
/// # Example
///
/// ```
/// use hospital_sim_core::events::{Context, EventKind, Handler, HandlerResult};
/// use hospital_sim_core::orchestrator::Kernel;
/// use hospital_sim_core::{HospitalState, PatientId};
///
/// #[derive(Default)]
/// struct Counter(usize);
///
/// impl Handler for Counter {
///     fn on_discharge(&mut self, _ctx: &mut Context<'_>, _patient: PatientId) -> HandlerResult {
///         self.0 += 1;
///         Ok(())
///     }
/// }
///
/// let mut kernel = Kernel::new(HospitalState::without_staff(1, 1));
/// kernel.add_handler(Counter::default());
/// kernel.schedule(5.0, EventKind::Discharge(PatientId(1))).unwrap();
/// kernel.schedule(2.0, EventKind::Discharge(PatientId(2))).unwrap();
///
/// let summary = kernel.run(f64::INFINITY).unwrap();
/// assert_eq!(summary.events_dispatched, 2);
/// assert_eq!(kernel.now(), 5.0);
/// assert_eq!(kernel.handler::<Counter>().unwrap().0, 2);
/// ```
pub struct Kernel {
    clock: SimClock,
    queue: EventQueue,
    state: HospitalState,
    handlers: Vec<Box<dyn Handler>>,
    anomalies: Vec<AnomalyRecord>,
    check_invariants: bool,
    cascade_limit: usize,
    events_dispatched: u64,
    cascades_dispatched: u64,
}

impl Kernel {
    pub fn new(state: HospitalState) -> Self {
        Self {
            clock: SimClock::new(),
            queue: EventQueue::new(),
            state,
            handlers: Vec::new(),
            anomalies: Vec::new(),
            check_invariants: true,
            cascade_limit: DEFAULT_CASCADE_LIMIT,
            events_dispatched: 0,
            cascades_dispatched: 0,
        }
    }

    pub fn with_cascade_limit(mut self, limit: usize) -> Self {
        self.cascade_limit = limit;
        self
    }

    /// Toggle the post-dispatch invariant check (on by default)
    pub fn set_check_invariants(&mut self, enabled: bool) {
        self.check_invariants = enabled;
    }

    /// Append a handler; handlers see events in registration order
    pub fn add_handler<H: Handler + 'static>(&mut self, handler: H) {
        self.handlers.push(Box::new(handler));
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    /// Enqueue `kind` at `time`, returning its sequence id
    pub fn schedule(&mut self, time: SimTime, kind: EventKind) -> Result<u64, SimulationError> {
        if !self.clock.accepts(time) {
            return Err(SimulationError::InvalidTime {
                time,
                now: self.clock.now(),
            });
        }
        Ok(self.queue.push(time, kind))
    }

    /// Dispatch `kind` immediately at the current time, with its cascades
    ///
    /// `kind` is offered to every handler first; events the handlers trigger
    /// in response are then dispatched in FIFO order. This is the reverse of
    /// a nested call-through dispatch, where a triggered event would reach
    /// all handlers before the triggering one reached the later handlers.
    pub fn trigger(&mut self, kind: EventKind) -> Result<(), SimulationError> {
        self.dispatch_instant(kind)
    }

    /// Dispatch events until the queue empties or the next event lies past
    /// `max_time`
    ///
    /// An event beyond `max_time` stays queued, so a later call resumes it.
    pub fn run(&mut self, max_time: SimTime) -> Result<RunSummary, SimulationError> {
        let events_before = self.events_dispatched;
        let cascades_before = self.cascades_dispatched;
        let anomalies_before = self.anomalies.len();
        info!(now = self.clock.now(), max_time, pending = self.queue.len(), "run start");

        let stop_reason = loop {
            match self.queue.peek_time() {
                None => break StopReason::QueueEmpty,
                Some(time) if time > max_time => break StopReason::TimeLimit,
                Some(_) => {}
            }
            let Some(event) = self.queue.pop() else {
                break StopReason::QueueEmpty;
            };
            self.clock.advance_to(event.time);
            self.dispatch_instant(event.kind)?;
        };

        let summary = RunSummary {
            events_dispatched: self.events_dispatched - events_before,
            cascades_dispatched: self.cascades_dispatched - cascades_before,
            anomalies: self.anomalies.len() - anomalies_before,
            final_time: self.clock.now(),
            stop_reason,
            pending: self.queue.len(),
        };
        info!(
            final_time = summary.final_time,
            events = summary.events_dispatched,
            cascades = summary.cascades_dispatched,
            anomalies = summary.anomalies,
            ?stop_reason,
            "run end"
        );
        Ok(summary)
    }

    fn dispatch_instant(&mut self, kind: EventKind) -> Result<(), SimulationError> {
        let mut cascade = VecDeque::new();
        self.dispatch_to_handlers(&kind, &mut cascade)?;
        self.events_dispatched += 1;

        let mut cascaded = 0usize;
        while let Some(next) = cascade.pop_front() {
            cascaded += 1;
            if cascaded > self.cascade_limit {
                return Err(ConsistencyError::CascadeOverflow {
                    limit: self.cascade_limit,
                    time: self.clock.now(),
                }
                .into());
            }
            self.dispatch_to_handlers(&next, &mut cascade)?;
            self.cascades_dispatched += 1;
        }
        Ok(())
    }

    fn dispatch_to_handlers(
        &mut self,
        kind: &EventKind,
        cascade: &mut VecDeque<EventKind>,
    ) -> Result<(), SimulationError> {
        let now = self.clock.now();
        let event = kind.name();
        debug!(time = now, event, "dispatch");

        for handler in self.handlers.iter_mut() {
            let mut ctx = Context {
                now,
                event,
                queue: &mut self.queue,
                cascade: &mut *cascade,
                state: &mut self.state,
                anomalies: &mut self.anomalies,
            };
            match dispatch(handler.as_mut(), &mut ctx, kind) {
                Ok(()) => {}
                Err(SimulationError::Anomaly(anomaly)) => ctx.report(anomaly),
                Err(err) => {
                    debug!(time = now, event, handler = handler.name(), %err, "handler failed");
                    return Err(err);
                }
            }
        }

        if self.check_invariants {
            self.state.verify_invariants()?;
        }
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn state(&self) -> &HospitalState {
        &self.state
    }

    /// Mutable state, for setting up a run before it starts
    pub fn state_mut(&mut self) -> &mut HospitalState {
        &mut self.state
    }

    /// Queued events in dispatch order
    pub fn pending(&self) -> Vec<&ScheduledEvent> {
        self.queue.snapshot()
    }

    pub fn anomalies(&self) -> &[AnomalyRecord] {
        &self.anomalies
    }

    /// Total events dispatched over the kernel's lifetime
    pub fn events_dispatched(&self) -> u64 {
        self.events_dispatched
    }

    pub fn cascades_dispatched(&self) -> u64 {
        self.cascades_dispatched
    }

    /// First registered handler of type `T`
    pub fn handler<T: Handler + 'static>(&self) -> Option<&T> {
        self.handlers
            .iter()
            .find_map(|handler| (**handler).as_any().downcast_ref::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::handler::HandlerResult;
    use crate::models::patient::PatientId;
    use crate::models::staff::StaffId;

    /// Records `(handler tag, event name, time)` into a shared trace
    struct Tracer {
        tag: &'static str,
        trace: std::rc::Rc<std::cell::RefCell<Vec<(&'static str, &'static str, SimTime)>>>,
        raise_on_staff_off: bool,
    }

    impl Tracer {
        fn push(&self, event: &'static str, time: SimTime) {
            self.trace.borrow_mut().push((self.tag, event, time));
        }
    }

    impl Handler for Tracer {
        fn on_staff_off(&mut self, ctx: &mut Context<'_>, staff: StaffId) -> HandlerResult {
            self.push("staff_off", ctx.now());
            if self.raise_on_staff_off {
                ctx.trigger(EventKind::StaffAvailable(staff));
            }
            Ok(())
        }

        fn on_staff_available(&mut self, ctx: &mut Context<'_>, _staff: StaffId) -> HandlerResult {
            self.push("staff_available", ctx.now());
            Ok(())
        }

        fn on_discharge(&mut self, ctx: &mut Context<'_>, patient: PatientId) -> HandlerResult {
            self.push("discharge", ctx.now());
            Err(Anomaly::UnknownPatient(patient).into())
        }
    }

    fn traced_kernel(
        raise: bool,
    ) -> (
        Kernel,
        std::rc::Rc<std::cell::RefCell<Vec<(&'static str, &'static str, SimTime)>>>,
    ) {
        let trace = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut kernel = Kernel::new(HospitalState::without_staff(1, 1));
        for tag in ["a", "b"] {
            kernel.add_handler(Tracer {
                tag,
                trace: trace.clone(),
                raise_on_staff_off: raise && tag == "a",
            });
        }
        (kernel, trace)
    }

    #[test]
    fn test_cascade_runs_after_all_handlers_see_event() {
        let (mut kernel, trace) = traced_kernel(true);
        kernel.schedule(4.0, EventKind::StaffOff(StaffId(1))).unwrap();
        kernel.schedule(4.0, EventKind::StaffOff(StaffId(2))).unwrap();

        let summary = kernel.run(10.0).unwrap();

        assert_eq!(
            *trace.borrow(),
            vec![
                ("a", "staff_off", 4.0),
                ("b", "staff_off", 4.0),
                ("a", "staff_available", 4.0),
                ("b", "staff_available", 4.0),
                ("a", "staff_off", 4.0),
                ("b", "staff_off", 4.0),
                ("a", "staff_available", 4.0),
                ("b", "staff_available", 4.0),
            ]
        );
        assert_eq!(summary.events_dispatched, 2);
        assert_eq!(summary.cascades_dispatched, 2);
    }

    #[test]
    fn test_anomaly_is_recorded_and_run_continues() {
        let (mut kernel, _trace) = traced_kernel(false);
        kernel.schedule(1.0, EventKind::Discharge(PatientId(7))).unwrap();
        kernel.schedule(2.0, EventKind::StaffOff(StaffId(1))).unwrap();

        let summary = kernel.run(f64::INFINITY).unwrap();

        assert_eq!(summary.events_dispatched, 2);
        // both handlers reported
        assert_eq!(kernel.anomalies().len(), 2);
        assert_eq!(kernel.anomalies()[0].event, "discharge");
        assert_eq!(kernel.anomalies()[0].time, 1.0);
    }

    #[test]
    fn test_run_leaves_future_event_queued() {
        let (mut kernel, _trace) = traced_kernel(false);
        kernel.schedule(1.0, EventKind::StaffOff(StaffId(1))).unwrap();
        kernel.schedule(50.0, EventKind::StaffOff(StaffId(2))).unwrap();

        let summary = kernel.run(10.0).unwrap();

        assert_eq!(summary.stop_reason, StopReason::TimeLimit);
        assert_eq!(summary.pending, 1);
        assert_eq!(kernel.now(), 1.0);
        assert_eq!(kernel.pending()[0].time, 50.0);

        let resumed = kernel.run(f64::INFINITY).unwrap();
        assert_eq!(resumed.events_dispatched, 1);
        assert_eq!(resumed.stop_reason, StopReason::QueueEmpty);
    }

    struct Loop;

    impl Handler for Loop {
        fn on_staff_available(&mut self, ctx: &mut Context<'_>, staff: StaffId) -> HandlerResult {
            ctx.trigger(EventKind::StaffAvailable(staff));
            Ok(())
        }
    }

    #[test]
    fn test_cascade_limit_is_fatal() {
        let mut kernel = Kernel::new(HospitalState::without_staff(1, 1)).with_cascade_limit(5);
        kernel.add_handler(Loop);
        kernel.schedule(0.0, EventKind::StaffAvailable(StaffId(1))).unwrap();

        let err = kernel.run(f64::INFINITY).unwrap_err();

        assert!(err.is_fatal());
        assert!(matches!(
            err,
            SimulationError::Consistency(ConsistencyError::CascadeOverflow { limit: 5, .. })
        ));
    }

    #[test]
    fn test_external_trigger_dispatches_immediately() {
        let (mut kernel, trace) = traced_kernel(true);

        kernel.trigger(EventKind::StaffOff(StaffId(3))).unwrap();

        assert_eq!(trace.borrow().len(), 4);
        assert_eq!(kernel.events_dispatched(), 1);
        assert_eq!(kernel.cascades_dispatched(), 1);
    }

    struct Corrupter;

    impl Handler for Corrupter {
        fn on_discharge(&mut self, ctx: &mut Context<'_>, patient: PatientId) -> HandlerResult {
            ctx.state_mut().resources.beds.assign(patient);
            Ok(())
        }
    }

    #[test]
    fn test_invariant_check_catches_overfill() {
        let mut kernel = Kernel::new(HospitalState::without_staff(1, 1));
        kernel.add_handler(Corrupter);
        kernel.schedule(0.0, EventKind::Discharge(PatientId(1))).unwrap();
        kernel.schedule(1.0, EventKind::Discharge(PatientId(2))).unwrap();

        let err = kernel.run(f64::INFINITY).unwrap_err();

        assert!(matches!(
            err,
            SimulationError::Consistency(ConsistencyError::CapacityExceeded { .. })
        ));
        assert_eq!(kernel.now(), 1.0);
    }

    #[test]
    fn test_schedule_rejects_past() {
        let mut kernel = Kernel::new(HospitalState::without_staff(1, 1));
        kernel.schedule(5.0, EventKind::Decline(PatientId(1))).unwrap();
        kernel.run(f64::INFINITY).unwrap();

        assert_eq!(
            kernel.schedule(4.0, EventKind::Decline(PatientId(2))),
            Err(SimulationError::InvalidTime { time: 4.0, now: 5.0 })
        );
    }
}
