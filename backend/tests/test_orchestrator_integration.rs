//! Integration tests for Orchestrator
//!
//! Config-driven runs end to end: determinism, resumable runs, report
//! bookkeeping and JSON configs.

use hospital_sim_core::orchestrator::StopReason;
use hospital_sim_core::{
    Orchestrator, PatientArrival, PatientId, PatientStatus, PolicyConfig, SimulationConfig,
    ShiftType, SimulationError, StaffConfig, MINUTES_PER_DAY,
};

fn staffed_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        seed,
        max_time: 3.0 * MINUTES_PER_DAY,
        beds: 4,
        ventilators: 3,
        policy: PolicyConfig::LeastBusy {
            max_patients: 2,
            shift_type: ShiftType::Day,
        },
        staff: StaffConfig {
            initial_on_shift: 2,
            initial_available: 2,
            shift_length: 720.0,
            rest_period: 480.0,
        },
        ..SimulationConfig::default()
    }
}

fn event_lines(orchestrator: &Orchestrator) -> String {
    orchestrator.event_log().unwrap().to_json_lines().unwrap()
}

#[test]
fn test_same_seed_same_run() {
    let mut a = Orchestrator::new(staffed_config(7)).unwrap();
    let mut b = Orchestrator::new(staffed_config(7)).unwrap();

    let report_a = a.run().unwrap();
    let report_b = b.run().unwrap();

    assert_eq!(report_a, report_b);
    assert_eq!(event_lines(&a), event_lines(&b));
    assert_eq!(
        a.outcome_logger().unwrap().rows(),
        b.outcome_logger().unwrap().rows()
    );
}

#[test]
fn test_different_seed_different_run() {
    let mut a = Orchestrator::new(staffed_config(1)).unwrap();
    let mut b = Orchestrator::new(staffed_config(2)).unwrap();

    a.run().unwrap();
    b.run().unwrap();

    assert_ne!(a.config_hash(), b.config_hash());
    assert_ne!(event_lines(&a), event_lines(&b));
}

#[test]
fn test_resumed_run_matches_single_run() {
    let mut whole = Orchestrator::new(staffed_config(11)).unwrap();
    let mut split = Orchestrator::new(staffed_config(11)).unwrap();

    let whole_report = whole.run().unwrap();
    let partial = split.run_until(MINUTES_PER_DAY).unwrap();
    assert!(split.now() <= MINUTES_PER_DAY);
    assert_eq!(partial.stop_reason, StopReason::TimeLimit);
    let split_report = split.run().unwrap();

    assert_eq!(whole_report, split_report);
    assert_eq!(event_lines(&whole), event_lines(&split));
}

#[test]
fn test_report_bookkeeping() {
    let mut orchestrator = Orchestrator::new(staffed_config(3)).unwrap();

    let report = orchestrator.run().unwrap();

    assert_eq!(report.policy, "least_busy");
    assert_eq!(report.stop_reason, StopReason::TimeLimit);
    assert!(report.final_time <= 3.0 * MINUTES_PER_DAY);
    assert!(report.arrivals > 0);
    assert_eq!(
        report.arrivals,
        report.admitted + report.declined + report.rejected_duplicates
    );
    assert_eq!(report.rejected_duplicates, 0);
    assert_eq!(
        (report.lives + report.deaths) as u64,
        report.discharged + report.declined
    );
    assert_eq!(report.deaths, report.admitted_deaths + report.declined_deaths);
    assert_eq!(report.census as u64, report.admitted - report.discharged);
    assert!(report.beds_in_use <= 4);
    assert!(report.ventilators_in_use <= 3);
    assert_eq!(report.anomalies, 0);

    let patients = orchestrator.patient_logger().unwrap();
    assert_eq!(patients.rows().len() as u64, report.arrivals);
}

#[test]
fn test_initial_roster_logged_as_shift_starts() {
    let orchestrator = Orchestrator::new(staffed_config(5)).unwrap();

    let log = orchestrator.event_log().unwrap();
    let starts = log.events_of_type("ShiftStart");

    assert_eq!(starts.len(), 2);
    assert_eq!(orchestrator.state().staff.num_active(), 2);
    assert_eq!(orchestrator.state().staff.available_staff().len(), 2);
}

#[test]
fn test_scripted_json_config() {
    let json = r#"{
        "seed": 1,
        "max_time": 1.0e9,
        "beds": 1,
        "ventilators": 1,
        "policy": { "type": "fcfs" },
        "scripted_arrivals": [
            { "time": 0.0, "patient": 1, "status": { "severity": "critical", "requires_vent": true } },
            { "time": 5.0, "patient": 2, "status": { "severity": "moderate", "requires_vent": false } }
        ]
    }"#;
    let config = SimulationConfig::from_json(json).unwrap();
    assert!(config.check_invariants);
    assert_eq!(config.staff, StaffConfig::default());

    let mut orchestrator = Orchestrator::new(config).unwrap();
    let report = orchestrator.run().unwrap();

    assert_eq!(report.policy, "fcfs");
    assert_eq!(report.stop_reason, StopReason::QueueEmpty);
    assert_eq!(report.arrivals, 2);
    assert_eq!(report.admitted, 1);
    assert_eq!(report.declined, 1);
    assert_eq!(report.discharged, 1);
    assert_eq!(report.census, 0);
    assert_eq!(report.beds_in_use, 0);

    let events = orchestrator.event_log().unwrap();
    assert_eq!(events.events_for_patient(PatientId(2)).len(), 3);
}

#[test]
fn test_unbounded_scripted_run_drains_queue() {
    let config = SimulationConfig {
        max_time: f64::INFINITY,
        scripted_arrivals: Some(vec![
            PatientArrival::new(10.0, PatientId(1), PatientStatus::ventilated()),
            PatientArrival::new(20.0, PatientId(2), PatientStatus::ventilated()),
        ]),
        ..SimulationConfig::default()
    };
    let mut orchestrator = Orchestrator::new(config).unwrap();

    let report = orchestrator.run().unwrap();

    assert_eq!(report.stop_reason, StopReason::QueueEmpty);
    assert_eq!(report.discharged, 2);
    assert_eq!(report.policy, "criteria");
}

#[test]
fn test_duplicate_arrivals_counted_in_report() {
    let vented = PatientStatus::ventilated();
    let config = SimulationConfig {
        max_time: f64::INFINITY,
        scripted_arrivals: Some(vec![
            PatientArrival::new(0.0, PatientId(1), vented),
            PatientArrival::new(1.0, PatientId(1), vented),
            PatientArrival::new(2.0, PatientId(2), vented),
        ]),
        ..SimulationConfig::default()
    };
    let mut orchestrator = Orchestrator::new(config).unwrap();

    let report = orchestrator.run().unwrap();

    assert_eq!(report.arrivals, 3);
    assert_eq!(report.rejected_duplicates, 1);
    assert_eq!(report.admitted, 2);
    assert_eq!(report.declined, 0);
    assert_eq!(report.anomalies, 1);
}

#[test]
fn test_ppe_stock_runs_down_over_shifts() {
    let json = r#"{
        "seed": 9,
        "max_time": 2880.0,
        "beds": 4,
        "ventilators": 2,
        "ppe_stock": 3,
        "policy": { "type": "least_busy", "max_patients": 2 },
        "staff": { "initial_on_shift": 1, "initial_available": 1,
                   "shift_length": 720.0, "rest_period": 480.0 },
        "scripted_arrivals": []
    }"#;
    let mut orchestrator = Orchestrator::new(SimulationConfig::from_json(json).unwrap()).unwrap();

    let report = orchestrator.run().unwrap();

    // shifts start at 0, 720, 1440, 2160 and 2880
    assert_eq!(report.ppe_consumed, 3);
    assert_eq!(report.ppe_remaining, 0);
    assert_eq!(report.unprotected_shifts, 2);
    assert_eq!(report.anomalies, 0);
}

#[test]
fn test_invalid_json_config_rejected() {
    let err = SimulationConfig::from_json(r#"{ "seed": 1 }"#).unwrap_err();
    assert!(matches!(err, SimulationError::InvalidConfig(_)));

    let err = SimulationConfig::from_json(
        r#"{ "seed": 1, "max_time": 10.0, "beds": 1, "ventilators": 1,
             "policy": { "type": "no_such_policy" } }"#,
    )
    .unwrap_err();
    assert!(matches!(err, SimulationError::InvalidConfig(_)));
}

#[test]
fn test_invalid_staff_config_rejected() {
    let mut config = staffed_config(1);
    config.staff.shift_length = 0.0;

    let result = Orchestrator::new(config);

    assert!(matches!(result, Err(SimulationError::InvalidConfig(_))));
}
