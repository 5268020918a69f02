//! Orchestrator - builds and drives a complete run
//!
//! Turns a [`SimulationConfig`] into a kernel with its handlers, primes the
//! first arrival and the initial staff roster, and summarizes the run in a
//! [`RunReport`].
//!
//! # Run setup
//!
//! 1. Validate the config and compute its hash
//! 2. Build the policy, staff force and resource pools
//! 3. Build the arrival source (scripted, or generated from the model on its
//!    own RNG stream) and the outcome model (on a second stream)
//! 4. Register handlers: patient flow, staffing, event/patient/outcome loggers
//! 5. Schedule the first arrival; put the initial roster on shift at t=0,
//!    each member drawing PPE from `ppe_stock` while it lasts
//!
//! # Example
//!
//! ```rust
//! use hospital_sim_core::orchestrator::{Orchestrator, PolicyConfig, SimulationConfig};
//!
//! let config = SimulationConfig {
//!     seed: 7,
//!     max_time: 5.0 * 1440.0,
//!     beds: 4,
//!     ventilators: 2,
//!     policy: PolicyConfig::Fcfs {
//!         max_beds: None,
//!         max_ventilators: None,
//!     },
//!     ..SimulationConfig::default()
//! };
//!
//! let mut orchestrator = Orchestrator::new(config).unwrap();
//! let report = orchestrator.run().unwrap();
//!
//! assert_eq!(report.policy, "fcfs");
//! assert_eq!(report.arrivals, report.admitted + report.declined + report.rejected_duplicates);
//! assert!(orchestrator.state().resources.num_beds_used() <= 4);
//! ```

use crate::arrivals::{GeneratedArrivals, PatientArrival, PatientArrivalSource, ScriptedArrivals};
use crate::core::time::{SimTime, MINUTES_PER_DAY};
use crate::events::types::EventKind;
use crate::handlers::{EventLogger, OutcomeLogger, PatientFlowHandler, PatientLogger, StaffingHandler};
use crate::models::event::EventLog;
use crate::models::staff::{ShiftType, StaffForce, StaffId};
use crate::models::state::HospitalState;
use crate::orchestrator::kernel::{Kernel, SimulationError, StopReason};
use crate::policy::{
    BedAndVentilatorCriteria, CriteriaPolicy, FirstComeFirstServed, HospitalPolicy, LeastBusy,
};
use crate::rng::RngManager;
use crate::stochastic::{ModelConfig, SeededOutcomeModel};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::rc::Rc;
use tracing::info;

/// RNG stream feeding generated arrivals
const ARRIVAL_STREAM: u64 = 1;

/// RNG stream feeding outcome and length-of-stay draws
const OUTCOME_STREAM: u64 = 2;

// ============================================================================
// Configuration Types
// ============================================================================

/// Admission/staffing policy selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Admit while counts allow; caps default to the pool capacities
    Fcfs {
        #[serde(default)]
        max_beds: Option<usize>,
        #[serde(default)]
        max_ventilators: Option<usize>,
    },

    /// Route to the least busy active staff member; restaff at shift end
    LeastBusy {
        /// Maximum patients per staff member at admission
        max_patients: usize,
        #[serde(default = "default_shift_type")]
        shift_type: ShiftType,
    },

    /// Admit iff a bed (and, when needed, a ventilator) is free
    BedAndVentilator,
}

fn default_shift_type() -> ShiftType {
    ShiftType::Day
}

/// Staff roster and shift timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffConfig {
    /// Members on shift at t=0 (ids 1..=n)
    pub initial_on_shift: usize,

    /// Members off duty and available at t=0 (ids following the on-shift ones)
    pub initial_available: usize,

    /// Shift length in minutes
    pub shift_length: SimTime,

    /// Rest between a shift's end and availability, in minutes
    pub rest_period: SimTime,
}

impl Default for StaffConfig {
    fn default() -> Self {
        Self {
            initial_on_shift: 0,
            initial_available: 0,
            shift_length: 720.0,
            rest_period: 720.0,
        }
    }
}

impl StaffConfig {
    pub fn total(&self) -> usize {
        self.initial_on_shift + self.initial_available
    }
}

fn default_true() -> bool {
    true
}

/// Complete description of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed for every random stream of the run
    pub seed: u64,

    /// Events after this time are not dispatched
    pub max_time: SimTime,

    pub beds: usize,
    pub ventilators: usize,

    pub policy: PolicyConfig,

    #[serde(default)]
    pub staff: StaffConfig,

    /// PPE units on hand at t=0; every fully protected shift draws one
    #[serde(default)]
    pub ppe_stock: u64,

    #[serde(default)]
    pub model: ModelConfig,

    /// Stop generating arrivals after this many
    #[serde(default)]
    pub max_arrivals: Option<usize>,

    /// Replaces generated arrivals when present
    #[serde(default)]
    pub scripted_arrivals: Option<Vec<PatientArrival>>,

    /// Verify capacity and assignment symmetry after every dispatch
    #[serde(default = "default_true")]
    pub check_invariants: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_time: 30.0 * MINUTES_PER_DAY,
            beds: 10,
            ventilators: 10,
            policy: PolicyConfig::BedAndVentilator,
            staff: StaffConfig::default(),
            ppe_stock: 0,
            model: ModelConfig::default(),
            max_arrivals: None,
            scripted_arrivals: None,
            check_invariants: true,
        }
    }
}

impl SimulationConfig {
    /// Parse a config from JSON
    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json)
            .map_err(|e| SimulationError::InvalidConfig(format!("config parse failed: {}", e)))
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |msg: String| Err(SimulationError::InvalidConfig(msg));

        if self.max_time.is_nan() || self.max_time < 0.0 {
            return invalid(format!("max_time must be non-negative, got {}", self.max_time));
        }
        let arrivals_bounded = self.scripted_arrivals.is_some() || self.max_arrivals.is_some();
        if self.max_time.is_infinite() && !arrivals_bounded {
            return invalid(
                "an unbounded max_time needs scripted arrivals or max_arrivals".to_string(),
            );
        }

        if let PolicyConfig::Fcfs {
            max_beds,
            max_ventilators,
        } = &self.policy
        {
            if let Some(cap) = max_beds.filter(|cap| *cap > self.beds) {
                return invalid(format!("max_beds {} exceeds beds {}", cap, self.beds));
            }
            if let Some(cap) = max_ventilators.filter(|cap| *cap > self.ventilators) {
                return invalid(format!(
                    "max_ventilators {} exceeds ventilators {}",
                    cap, self.ventilators
                ));
            }
        }

        let staff = &self.staff;
        // with someone to rotate in, every LeastBusy shift end starts another shift
        let rotates_forever = matches!(self.policy, PolicyConfig::LeastBusy { .. })
            && staff.initial_on_shift > 0
            && staff.initial_available > 0;
        if self.max_time.is_infinite() && rotates_forever {
            return invalid(
                "least_busy with a rotating roster needs a finite max_time".to_string(),
            );
        }

        if !(staff.shift_length > 0.0 && staff.shift_length.is_finite()) {
            return invalid(format!(
                "shift_length must be positive, got {}",
                staff.shift_length
            ));
        }
        if !(staff.rest_period >= 0.0 && staff.rest_period.is_finite()) {
            return invalid(format!(
                "rest_period must be non-negative, got {}",
                staff.rest_period
            ));
        }

        if let Some(arrivals) = &self.scripted_arrivals {
            if let Some(bad) = arrivals
                .iter()
                .find(|a| !(a.time.is_finite() && a.time >= 0.0))
            {
                return invalid(format!(
                    "scripted arrival for {} has invalid time {}",
                    bad.patient, bad.time
                ));
            }
        }

        self.model.validate().map_err(SimulationError::InvalidConfig)
    }

    /// SHA-256 of the canonical JSON form (object keys sorted)
    pub fn config_hash(&self) -> Result<String, SimulationError> {
        use serde_json::Value;
        use std::collections::BTreeMap;

        let value = serde_json::to_value(self).map_err(|e| {
            SimulationError::InvalidConfig(format!("config serialization failed: {}", e))
        })?;

        fn canonicalize(value: Value) -> Value {
            match value {
                Value::Object(map) => {
                    let sorted: BTreeMap<String, Value> =
                        map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                    Value::Object(sorted.into_iter().collect())
                }
                Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
                other => other,
            }
        }

        let json = serde_json::to_string(&canonicalize(value)).map_err(|e| {
            SimulationError::InvalidConfig(format!("config serialization failed: {}", e))
        })?;

        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }

    fn build_policy(&self) -> Rc<dyn HospitalPolicy> {
        match &self.policy {
            PolicyConfig::Fcfs {
                max_beds,
                max_ventilators,
            } => Rc::new(FirstComeFirstServed::new(
                max_beds.unwrap_or(self.beds),
                max_ventilators.unwrap_or(self.ventilators),
            )),
            PolicyConfig::LeastBusy {
                max_patients,
                shift_type,
            } => Rc::new(
                LeastBusy::new(*max_patients, self.staff.shift_length)
                    .with_shift_type(*shift_type),
            ),
            PolicyConfig::BedAndVentilator => Rc::new(CriteriaPolicy::new(BedAndVentilatorCriteria)),
        }
    }

    fn build_arrivals(&self) -> Result<Box<dyn PatientArrivalSource>, SimulationError> {
        if let Some(arrivals) = &self.scripted_arrivals {
            return Ok(Box::new(ScriptedArrivals::new(arrivals.clone())));
        }
        let model = SeededOutcomeModel::from_rng(
            self.model.clone(),
            RngManager::for_stream(self.seed, ARRIVAL_STREAM),
        )
        .map_err(SimulationError::InvalidConfig)?;
        let generated = GeneratedArrivals::new(model, 0.0);
        Ok(match self.max_arrivals {
            Some(limit) => Box::new(generated.with_limit(limit)),
            None => Box::new(generated),
        })
    }
}

// ============================================================================
// Run Report
// ============================================================================

/// Cumulative results of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub policy: String,
    pub config_hash: String,
    pub final_time: SimTime,
    pub stop_reason: StopReason,

    pub events_dispatched: u64,
    pub cascades_dispatched: u64,
    pub anomalies: usize,

    pub arrivals: u64,
    pub admitted: u64,
    pub declined: u64,
    pub discharged: u64,
    /// Arrivals dropped because their id was already present
    pub rejected_duplicates: u64,

    pub lives: usize,
    pub deaths: usize,
    pub admitted_deaths: usize,
    pub declined_deaths: usize,

    /// Patients still in the facility
    pub census: usize,
    pub beds_in_use: usize,
    pub ventilators_in_use: usize,

    /// PPE units left in stock
    pub ppe_remaining: u64,
    /// PPE units drawn by fully protected shifts
    pub ppe_consumed: u64,
    /// Shifts started without PPE
    pub unprotected_shifts: u64,
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct Orchestrator {
    kernel: Kernel,
    config: SimulationConfig,
    config_hash: String,
    policy_name: &'static str,
}

impl Orchestrator {
    /// Build a run from `config`
    ///
    /// Fails with [`SimulationError::InvalidConfig`] if the config does not
    /// validate.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let config_hash = config.config_hash()?;

        let policy = config.build_policy();
        let policy_name = policy.name();

        let staff = StaffForce::with_available((1..=config.staff.total() as u64).map(StaffId));
        let state =
            HospitalState::new(config.beds, config.ventilators, staff).with_ppe(config.ppe_stock);

        let outcome_model = SeededOutcomeModel::from_rng(
            config.model.clone(),
            RngManager::for_stream(config.seed, OUTCOME_STREAM),
        )
        .map_err(SimulationError::InvalidConfig)?;
        let mut flow = PatientFlowHandler::new(
            policy.clone(),
            config.build_arrivals()?,
            Box::new(outcome_model),
        );
        let first_arrival = flow.first_arrival();

        let mut kernel = Kernel::new(state);
        kernel.set_check_invariants(config.check_invariants);
        kernel.add_handler(flow);
        kernel.add_handler(StaffingHandler::new(policy, config.staff.rest_period));
        kernel.add_handler(EventLogger::new());
        kernel.add_handler(PatientLogger::new());
        kernel.add_handler(OutcomeLogger::new());

        if let Some(arrival) = first_arrival {
            kernel.schedule(arrival.time, EventKind::Arrival(arrival))?;
        }

        let shift_length = config.staff.shift_length;
        for id in 1..=config.staff.initial_on_shift as u64 {
            let staff = StaffId(id);
            kernel
                .state_mut()
                .staff
                .start_shift(staff, ShiftType::Day, shift_length)?;
            let ppe = kernel.state_mut().ppe.issue();
            kernel.schedule(shift_length, EventKind::StaffOff(staff))?;
            kernel.trigger(EventKind::ShiftStart {
                staff,
                shift_type: ShiftType::Day,
                end_of_shift: shift_length,
                ppe,
            })?;
        }

        info!(
            policy = policy_name,
            seed = config.seed,
            beds = config.beds,
            ventilators = config.ventilators,
            staff = config.staff.total(),
            ppe_stock = config.ppe_stock,
            config_hash = %config_hash,
            "orchestrator ready"
        );

        Ok(Self {
            kernel,
            config,
            config_hash,
            policy_name,
        })
    }

    /// Run to the configured `max_time`
    pub fn run(&mut self) -> Result<RunReport, SimulationError> {
        self.run_until(self.config.max_time)
    }

    /// Run until `max_time`; the report covers everything dispatched so far
    pub fn run_until(&mut self, max_time: SimTime) -> Result<RunReport, SimulationError> {
        let summary = self.kernel.run(max_time)?;
        Ok(self.report(summary.stop_reason))
    }

    fn report(&self, stop_reason: StopReason) -> RunReport {
        let flow = self
            .kernel
            .handler::<PatientFlowHandler>()
            .map(|flow| flow.stats())
            .unwrap_or_default();
        let outcomes = self.kernel.handler::<OutcomeLogger>();
        let count = |f: fn(&OutcomeLogger) -> usize| outcomes.map(f).unwrap_or(0);
        let state = self.kernel.state();

        RunReport {
            policy: self.policy_name.to_string(),
            config_hash: self.config_hash.clone(),
            final_time: self.kernel.now(),
            stop_reason,
            events_dispatched: self.kernel.events_dispatched(),
            cascades_dispatched: self.kernel.cascades_dispatched(),
            anomalies: self.kernel.anomalies().len(),
            arrivals: flow.arrivals,
            admitted: flow.admitted,
            declined: flow.declined,
            discharged: flow.discharged,
            rejected_duplicates: flow.rejected_duplicates,
            lives: count(OutcomeLogger::lives),
            deaths: count(OutcomeLogger::deaths),
            admitted_deaths: count(OutcomeLogger::admitted_deaths),
            declined_deaths: count(OutcomeLogger::declined_deaths),
            census: state.census(),
            beds_in_use: state.resources.num_beds_used(),
            ventilators_in_use: state.resources.num_vented(),
            ppe_remaining: state.ppe.level(),
            ppe_consumed: state.ppe.consumed(),
            unprotected_shifts: state.ppe.unprotected_shifts(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn now(&self) -> SimTime {
        self.kernel.now()
    }

    pub fn state(&self) -> &HospitalState {
        self.kernel.state()
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn event_log(&self) -> Option<&EventLog> {
        self.kernel.handler::<EventLogger>().map(EventLogger::log)
    }

    pub fn patient_logger(&self) -> Option<&PatientLogger> {
        self.kernel.handler::<PatientLogger>()
    }

    pub fn outcome_logger(&self) -> Option<&OutcomeLogger> {
        self.kernel.handler::<OutcomeLogger>()
    }
}
