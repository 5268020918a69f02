//! Staff force lifecycle and assignment-graph symmetry

use hospital_sim_core::{
    ConsistencyError, PatientId, ShiftType, StaffForce, StaffId, StaffState,
};
use proptest::prelude::*;

fn force(ids: &[u64]) -> StaffForce {
    StaffForce::with_available(ids.iter().copied().map(StaffId))
}

#[test]
fn test_full_lifecycle() {
    let mut staff = force(&[1]);
    let sid = StaffId(1);
    assert_eq!(staff.state_of(sid).unwrap(), StaffState::Available);

    staff.start_shift(sid, ShiftType::Night, 720.0).unwrap();
    assert_eq!(staff.state_of(sid).unwrap(), StaffState::Active);
    assert_eq!(staff.end_of_shift(sid), Some(720.0));

    assert!(staff.assign(sid, PatientId(7)).unwrap());
    assert!(!staff.assign(sid, PatientId(7)).unwrap());
    assert_eq!(staff.load(sid), 1);

    let orphans = staff.make_unavailable(sid, 720.0).unwrap();
    assert_eq!(orphans.into_iter().collect::<Vec<_>>(), vec![PatientId(7)]);
    assert_eq!(staff.state_of(sid).unwrap(), StaffState::Unavailable);
    assert!(staff.staff_of(PatientId(7)).is_empty());
    assert_eq!(staff.end_of_shift(sid), None);
    assert_eq!(staff.last_shift_end(sid), Some(720.0));

    staff.make_available(sid).unwrap();
    assert_eq!(staff.state_of(sid).unwrap(), StaffState::Available);
    staff.verify_symmetry().unwrap();
}

#[test]
fn test_illegal_transitions_rejected() {
    let mut staff = force(&[1]);
    let sid = StaffId(1);

    assert!(matches!(
        staff.make_unavailable(sid, 0.0),
        Err(ConsistencyError::InvalidTransition { .. })
    ));
    assert!(matches!(
        staff.make_available(sid),
        Err(ConsistencyError::InvalidTransition { .. })
    ));

    staff.start_shift(sid, ShiftType::Day, 720.0).unwrap();
    assert!(matches!(
        staff.start_shift(sid, ShiftType::Day, 720.0),
        Err(ConsistencyError::InvalidTransition { .. })
    ));
}

#[test]
fn test_assign_requires_active_member() {
    let mut staff = force(&[1]);

    let err = staff.assign(StaffId(1), PatientId(1)).unwrap_err();

    assert!(matches!(err, ConsistencyError::StaffNotActive { .. }));
    assert!(staff.staff_of(PatientId(1)).is_empty());
}

#[test]
fn test_unknown_member_is_an_error() {
    let mut staff = force(&[1]);
    assert!(staff.state_of(StaffId(9)).is_err());
    assert!(staff.start_shift(StaffId(9), ShiftType::Day, 1.0).is_err());
}

#[test]
fn test_remove_patient_clears_every_edge() {
    let mut staff = force(&[1, 2]);
    for id in [1, 2] {
        staff.start_shift(StaffId(id), ShiftType::Day, 720.0).unwrap();
        staff.assign(StaffId(id), PatientId(5)).unwrap();
    }

    let holders = staff.remove_patient(PatientId(5)).unwrap();

    assert_eq!(holders.len(), 2);
    assert_eq!(staff.load(StaffId(1)), 0);
    assert_eq!(staff.load(StaffId(2)), 0);
    assert!(staff.remove_patient(PatientId(5)).unwrap().is_empty());
}

#[test]
fn test_least_busy_and_most_rested_tie_break_on_lowest_id() {
    let mut staff = force(&[1, 2, 3, 4]);
    for id in [1, 2, 3] {
        staff.start_shift(StaffId(id), ShiftType::Day, 720.0).unwrap();
    }
    staff.assign(StaffId(1), PatientId(1)).unwrap();
    assert_eq!(staff.least_busy(), Some(StaffId(2)));

    // 4 never worked; it beats anyone who has rested
    staff.make_unavailable(StaffId(3), 100.0).unwrap();
    staff.make_available(StaffId(3)).unwrap();
    assert_eq!(staff.most_rested(), Some(StaffId(4)));

    staff.start_shift(StaffId(4), ShiftType::Day, 720.0).unwrap();
    assert_eq!(staff.most_rested(), Some(StaffId(3)));
}

#[derive(Debug, Clone)]
enum Op {
    StartShift(u64),
    EndShift(u64),
    Rest(u64),
    Assign(u64, u64),
    Unassign(u64, u64),
    RemovePatient(u64),
}

fn op() -> impl Strategy<Value = Op> {
    let sid = 1u64..=4;
    let pid = 1u64..=6;
    prop_oneof![
        sid.clone().prop_map(Op::StartShift),
        sid.clone().prop_map(Op::EndShift),
        sid.clone().prop_map(Op::Rest),
        (sid.clone(), pid.clone()).prop_map(|(s, p)| Op::Assign(s, p)),
        (sid, pid.clone()).prop_map(|(s, p)| Op::Unassign(s, p)),
        pid.prop_map(Op::RemovePatient),
    ]
}

proptest! {
    #[test]
    fn prop_assignment_graph_stays_symmetric(ops in prop::collection::vec(op(), 0..120)) {
        let mut staff = force(&[1, 2, 3, 4]);

        for (step, op) in ops.iter().enumerate() {
            // rejected operations must leave the graph untouched
            let _ = match *op {
                Op::StartShift(s) => staff
                    .start_shift(StaffId(s), ShiftType::Day, step as f64 + 720.0)
                    .map(|_| ()),
                Op::EndShift(s) => staff.make_unavailable(StaffId(s), step as f64).map(|_| ()),
                Op::Rest(s) => staff.make_available(StaffId(s)),
                Op::Assign(s, p) => staff.assign(StaffId(s), PatientId(p)).map(|_| ()),
                Op::Unassign(s, p) => staff.unassign(StaffId(s), PatientId(p)),
                Op::RemovePatient(p) => staff.remove_patient(PatientId(p)).map(|_| ()),
            };
            prop_assert!(staff.verify_symmetry().is_ok(), "asymmetric after {:?}", op);

            let forward: usize = (1..=4).map(|s| staff.load(StaffId(s))).sum();
            let reverse: usize = (1..=6).map(|p| staff.staff_of(PatientId(p)).len()).sum();
            prop_assert_eq!(forward, reverse);

            for s in 1..=4 {
                if staff.state_of(StaffId(s)).unwrap() != StaffState::Active {
                    prop_assert_eq!(staff.load(StaffId(s)), 0);
                }
            }
        }
    }
}
