//! Hospital Capacity Simulator Core
//!
//! Discrete-event simulator for comparing admission and staffing policies
//! under contested beds, ventilators and staff shifts.
//!
//! # Architecture
//!
//! - **core**: Simulated clock and pending-event queue
//! - **events**: Event kinds, handler capabilities, dispatch
//! - **models**: Domain state (patients, resource pools, staff force)
//! - **policy**: Admission and staffing decisions
//! - **handlers**: Patient flow, staffing, observers
//! - **arrivals**: Patient arrival sources
//! - **stochastic**: Outcome, length-of-stay and arrival draws
//! - **orchestrator**: Scheduling kernel and config-driven runs
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Resource holders never exceed capacity
//! 2. The staff↔patient assignment graph is symmetric
//! 3. Events dispatch in `(time, sequence)` order; the clock never moves back
//! 4. All randomness is deterministic (seeded RNG)

pub mod arrivals;
pub mod core;
pub mod events;
pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod policy;
pub mod rng;
pub mod stochastic;

// Re-exports for convenience
pub use arrivals::{PatientArrival, PatientArrivalSource};
pub use core::time::{SimClock, SimTime, MINUTES_PER_DAY};
pub use events::{EventKind, Handler};
pub use models::{
    error::{Anomaly, ConsistencyError},
    event::{Event, EventLog},
    patient::{Outcome, PatientId, PatientState, PatientStatus, Severity},
    ppe::{Ppe, PpeStock},
    resource::{ResourceKind, ResourcePool, ResourceState},
    staff::{ShiftType, StaffForce, StaffId, StaffState},
    state::HospitalState,
};
pub use orchestrator::{
    Kernel, Orchestrator, PolicyConfig, RunReport, SimulationConfig, SimulationError, StaffConfig,
};
pub use policy::HospitalPolicy;
pub use rng::RngManager;
pub use stochastic::{ModelConfig, StochasticOutcomeModel};
