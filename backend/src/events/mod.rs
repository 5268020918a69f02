//! Kernel events and handler dispatch

pub mod handler;
pub mod types;

pub use handler::{dispatch, AnomalyRecord, AsAny, Context, Handler, HandlerResult};
pub use types::{EventKind, PatientOutcome, ScheduledEvent};
