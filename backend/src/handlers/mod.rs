//! Reference handlers
//!
//! - [`PatientFlowHandler`]: admission, decline, discharge and outcome draws
//! - [`StaffingHandler`]: staff assignment, shift ends, rest periods
//! - [`EventLogger`], [`PatientLogger`], [`OutcomeLogger`]: observers
//!
//! Registration order matters: observers registered after the mutators see
//! the state those produced for the same event.

pub mod flow;
pub mod loggers;
pub mod staffing;

pub use flow::{FlowStats, PatientFlowHandler};
pub use loggers::{EventLogger, OutcomeLogger, OutcomeRow, PatientLogger, PatientRow};
pub use staffing::StaffingHandler;
