//! Orchestrator - scheduling kernel and run assembly
//!
//! - `kernel.rs`: the discrete-event loop, [`Kernel`]
//! - `engine.rs`: config-driven run setup and reporting, [`Orchestrator`]

pub mod engine;
pub mod kernel;

pub use engine::{Orchestrator, PolicyConfig, RunReport, SimulationConfig, StaffConfig};
pub use kernel::{Kernel, RunSummary, SimulationError, StopReason, DEFAULT_CASCADE_LIMIT};
