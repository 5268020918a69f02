//! Core primitives: the simulated clock and the event queue

pub mod queue;
pub mod time;
