//! Deterministic random number generation
//!
//! Uses xorshift64* for fast, seeded sampling. All randomness in the
//! reference stochastic models goes through this module.

mod xorshift;

pub use xorshift::RngManager;
