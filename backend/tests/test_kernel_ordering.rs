//! Kernel dispatch ordering
//!
//! Events come out in nondecreasing time order, same-time events in the
//! order they were scheduled, and nothing past `max_time` is consumed.

use hospital_sim_core::events::{Context, HandlerResult};
use hospital_sim_core::orchestrator::StopReason;
use hospital_sim_core::{EventKind, Handler, HospitalState, Kernel, PatientId, SimulationError};
use proptest::prelude::*;

/// Records `(time, tag)` for every discharge it sees
#[derive(Default)]
struct Recorder {
    seen: Vec<(f64, u64)>,
}

impl Handler for Recorder {
    fn on_discharge(&mut self, ctx: &mut Context<'_>, patient: PatientId) -> HandlerResult {
        self.seen.push((ctx.now(), patient.0));
        Ok(())
    }
}

fn kernel_with_recorder() -> Kernel {
    let mut kernel = Kernel::new(HospitalState::without_staff(1, 1));
    kernel.add_handler(Recorder::default());
    kernel
}

fn seen(kernel: &Kernel) -> Vec<(f64, u64)> {
    kernel.handler::<Recorder>().unwrap().seen.clone()
}

#[test]
fn test_equal_times_dispatch_in_schedule_order() {
    let mut kernel = kernel_with_recorder();
    for tag in 1..=5 {
        kernel.schedule(10.0, EventKind::Discharge(PatientId(tag))).unwrap();
    }

    kernel.run(f64::INFINITY).unwrap();

    let tags: Vec<u64> = seen(&kernel).iter().map(|(_, tag)| *tag).collect();
    assert_eq!(tags, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_earlier_event_scheduled_later_runs_first() {
    let mut kernel = kernel_with_recorder();
    kernel.schedule(30.0, EventKind::Discharge(PatientId(1))).unwrap();
    kernel.schedule(20.0, EventKind::Discharge(PatientId(2))).unwrap();
    kernel.schedule(30.0, EventKind::Discharge(PatientId(3))).unwrap();

    let summary = kernel.run(f64::INFINITY).unwrap();

    assert_eq!(seen(&kernel), vec![(20.0, 2), (30.0, 1), (30.0, 3)]);
    assert_eq!(summary.stop_reason, StopReason::QueueEmpty);
    assert_eq!(summary.final_time, 30.0);
}

#[test]
fn test_event_past_max_time_stays_queued() {
    let mut kernel = kernel_with_recorder();
    kernel.schedule(5.0, EventKind::Discharge(PatientId(1))).unwrap();
    kernel.schedule(50.0, EventKind::Discharge(PatientId(2))).unwrap();

    let summary = kernel.run(49.0).unwrap();

    assert_eq!(summary.stop_reason, StopReason::TimeLimit);
    assert_eq!(summary.events_dispatched, 1);
    assert_eq!(summary.pending, 1);
    assert_eq!(kernel.now(), 5.0);

    // an event exactly at max_time is dispatched
    let summary = kernel.run(50.0).unwrap();
    assert_eq!(summary.events_dispatched, 1);
    assert_eq!(summary.stop_reason, StopReason::QueueEmpty);
    assert_eq!(seen(&kernel), vec![(5.0, 1), (50.0, 2)]);
}

#[test]
fn test_schedule_rejects_past_and_non_finite_times() {
    let mut kernel = kernel_with_recorder();
    kernel.schedule(10.0, EventKind::Discharge(PatientId(1))).unwrap();
    kernel.run(f64::INFINITY).unwrap();

    let err = kernel
        .schedule(9.0, EventKind::Discharge(PatientId(2)))
        .unwrap_err();
    assert_eq!(err, SimulationError::InvalidTime { time: 9.0, now: 10.0 });

    assert!(kernel
        .schedule(f64::INFINITY, EventKind::Discharge(PatientId(3)))
        .is_err());
    assert!(kernel
        .schedule(f64::NAN, EventKind::Discharge(PatientId(4)))
        .is_err());
    assert_eq!(kernel.pending().len(), 0);
}

#[test]
fn test_empty_queue_returns_immediately() {
    let mut kernel = kernel_with_recorder();

    let summary = kernel.run(100.0).unwrap();

    assert_eq!(summary.events_dispatched, 0);
    assert_eq!(summary.stop_reason, StopReason::QueueEmpty);
    assert_eq!(kernel.now(), 0.0);
}

proptest! {
    #[test]
    fn prop_dispatch_is_time_ordered_and_fifo_on_ties(
        times in prop::collection::vec(0u32..200, 0..60)
    ) {
        let mut kernel = kernel_with_recorder();
        for (tag, time) in times.iter().enumerate() {
            kernel
                .schedule(f64::from(*time), EventKind::Discharge(PatientId(tag as u64)))
                .unwrap();
        }

        let summary = kernel.run(f64::INFINITY).unwrap();
        let seen = seen(&kernel);

        prop_assert_eq!(summary.events_dispatched, times.len() as u64);
        prop_assert_eq!(seen.len(), times.len());
        for pair in seen.windows(2) {
            let (t0, tag0) = pair[0];
            let (t1, tag1) = pair[1];
            prop_assert!(t0 <= t1);
            if t0 == t1 {
                prop_assert!(tag0 < tag1);
            }
        }
        for (time, tag) in &seen {
            prop_assert_eq!(*time, f64::from(times[*tag as usize]));
        }
    }

    #[test]
    fn prop_split_runs_match_single_run(
        times in prop::collection::vec(0u32..200, 1..40),
        cut in 0u32..200,
    ) {
        let schedule_all = |kernel: &mut Kernel| {
            for (tag, time) in times.iter().enumerate() {
                kernel
                    .schedule(f64::from(*time), EventKind::Discharge(PatientId(tag as u64)))
                    .unwrap();
            }
        };

        let mut whole = kernel_with_recorder();
        schedule_all(&mut whole);
        whole.run(f64::INFINITY).unwrap();

        let mut split = kernel_with_recorder();
        schedule_all(&mut split);
        split.run(f64::from(cut)).unwrap();
        prop_assert!(seen(&split).iter().all(|(t, _)| *t <= f64::from(cut)));
        split.run(f64::INFINITY).unwrap();

        prop_assert_eq!(seen(&whole), seen(&split));
    }
}
