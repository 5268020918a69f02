//! Patient model
//!
//! A patient record exists from arrival until its terminal outcome (decline
//! or discharge). Ids of removed patients are remembered so that events
//! scheduled before the exit (e.g. a discharge) can be recognized as stale.

use crate::models::error::Anomaly;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Opaque patient handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub u64);

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Acuity class of an arriving patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Moderate,
    Severe,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Moderate, Severity::Severe, Severity::Critical];

    pub fn name(&self) -> &'static str {
        match self {
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Critical => "critical",
        }
    }
}

/// Clinical status carried by an arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientStatus {
    pub severity: Severity,
    pub requires_vent: bool,
}

impl PatientStatus {
    pub fn new(severity: Severity, requires_vent: bool) -> Self {
        Self {
            severity,
            requires_vent,
        }
    }

    /// Critical patient on a ventilator
    pub fn ventilated() -> Self {
        Self::new(Severity::Critical, true)
    }

    /// Patient needing a bed only
    pub fn bed_only(severity: Severity) -> Self {
        Self::new(severity, false)
    }
}

/// Terminal outcome of a patient's stay (or of being declined)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Lives,
    Dies,
}

/// Registry of patients currently in the facility
///
/// # Example
///
/// ```rust
/// use hospital_sim_core::{PatientId, PatientState, PatientStatus};
///
/// let mut patients = PatientState::new();
/// patients.add(PatientId(1), PatientStatus::ventilated()).unwrap();
///
/// assert!(patients.add(PatientId(1), PatientStatus::ventilated()).is_err());
/// assert_eq!(patients.len(), 1);
///
/// patients.remove(PatientId(1)).unwrap();
/// assert!(patients.has_exited(PatientId(1)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatientState {
    patients: BTreeMap<PatientId, PatientStatus>,
    exited: BTreeSet<PatientId>,
}

impl PatientState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an arriving patient
    ///
    /// A duplicate id keeps the existing record and reports
    /// [`Anomaly::DuplicatePatient`].
    pub fn add(&mut self, pid: PatientId, status: PatientStatus) -> Result<(), Anomaly> {
        if self.patients.contains_key(&pid) {
            return Err(Anomaly::DuplicatePatient(pid));
        }
        self.patients.insert(pid, status);
        Ok(())
    }

    /// Status of a present patient
    pub fn get(&self, pid: PatientId) -> Result<&PatientStatus, Anomaly> {
        self.patients.get(&pid).ok_or(Anomaly::UnknownPatient(pid))
    }

    /// Remove a patient and remember it as exited
    pub fn remove(&mut self, pid: PatientId) -> Result<PatientStatus, Anomaly> {
        let status = self
            .patients
            .remove(&pid)
            .ok_or(Anomaly::UnknownPatient(pid))?;
        self.exited.insert(pid);
        Ok(status)
    }

    pub fn contains(&self, pid: PatientId) -> bool {
        self.patients.contains_key(&pid)
    }

    /// Whether this patient has already left the facility
    pub fn has_exited(&self, pid: PatientId) -> bool {
        self.exited.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }

    pub fn num_exited(&self) -> usize {
        self.exited.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PatientId, &PatientStatus)> {
        self.patients.iter().map(|(pid, status)| (*pid, status))
    }
}
