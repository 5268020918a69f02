//! Protective equipment stock
//!
//! Every shift starts with a protection grade. A fully protected shift draws
//! one unit from the facility's stock; an unprotected shift draws nothing and
//! is counted as a shortfall.

use crate::models::error::Anomaly;
use crate::models::staff::StaffId;
use serde::{Deserialize, Serialize};

/// Protection a staff member works a shift with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ppe {
    FullPpe,
    NoPpe,
}

/// Facility PPE stock and its consumption so far
///
/// # Example
///
/// ```
/// use hospital_sim_core::models::ppe::{Ppe, PpeStock};
///
/// let mut stock = PpeStock::new(1);
/// assert_eq!(stock.issue(), Ppe::FullPpe);
/// assert_eq!(stock.issue(), Ppe::NoPpe);
/// assert_eq!((stock.level(), stock.consumed(), stock.unprotected_shifts()), (0, 1, 1));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpeStock {
    level: u64,
    consumed: u64,
    unprotected_shifts: u64,
}

impl PpeStock {
    pub fn new(level: u64) -> Self {
        Self {
            level,
            consumed: 0,
            unprotected_shifts: 0,
        }
    }

    /// Units left
    pub fn level(&self) -> u64 {
        self.level
    }

    pub fn has_stock(&self) -> bool {
        self.level > 0
    }

    /// Units drawn by fully protected shifts
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Shifts started without protection
    pub fn unprotected_shifts(&self) -> u64 {
        self.unprotected_shifts
    }

    /// Draw the equipment for one shift of `staff`
    ///
    /// Fails with [`Anomaly::PpeExhausted`] when full protection is requested
    /// from an empty stock; nothing is recorded in that case.
    pub fn consume(&mut self, staff: StaffId, ppe: Ppe) -> Result<(), Anomaly> {
        match ppe {
            Ppe::FullPpe => {
                if self.level == 0 {
                    return Err(Anomaly::PpeExhausted(staff));
                }
                self.level -= 1;
                self.consumed += 1;
            }
            Ppe::NoPpe => self.unprotected_shifts += 1,
        }
        Ok(())
    }

    /// Best grade the stock allows, drawn immediately
    pub fn issue(&mut self) -> Ppe {
        if self.has_stock() {
            self.level -= 1;
            self.consumed += 1;
            Ppe::FullPpe
        } else {
            self.unprotected_shifts += 1;
            Ppe::NoPpe
        }
    }
}
