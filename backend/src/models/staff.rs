//! Staff force model
//!
//! Each staff member cycles through a three-state lifecycle:
//!
//! ```text
//!              start_shift                make_unavailable
//!  AVAILABLE ──────────────▶ ACTIVE ──────────────────────▶ UNAVAILABLE
//!      ▲                                                         │
//!      └─────────────────────── make_available ──────────────────┘
//! ```
//!
//! No other transition exists. While ACTIVE a member holds zero or more
//! patients. The staff→patient edges live on the [`StaffRecord`] and the
//! patient→staff edges in a reverse index; every mutation updates both sides
//! before returning.
//!
//! # Critical Invariants
//!
//! 1. Exactly one [`StaffState`] per staff id
//! 2. `p ∈ patients_of(s) ⇔ s ∈ staff_of(p)`
//! 3. Only ACTIVE members hold patients
//! 4. Records are never deleted

use crate::core::time::SimTime;
use crate::models::error::{Anomaly, ConsistencyError};
use crate::models::patient::PatientId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Opaque staff handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(pub u64);

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Lifecycle state of a staff member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffState {
    /// Off duty, eligible to start a shift
    Available,
    /// On shift
    Active,
    /// Post-shift cooldown
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftType {
    Day,
    Night,
}

/// Per-member record
#[derive(Debug, Clone, PartialEq)]
pub struct StaffRecord {
    state: StaffState,
    shift_type: Option<ShiftType>,
    end_of_shift: Option<SimTime>,
    patients: BTreeSet<PatientId>,
    last_shift_end: Option<SimTime>,
}

impl StaffRecord {
    fn available() -> Self {
        Self {
            state: StaffState::Available,
            shift_type: None,
            end_of_shift: None,
            patients: BTreeSet::new(),
            last_shift_end: None,
        }
    }

    pub fn state(&self) -> StaffState {
        self.state
    }

    /// Shift currently worked (ACTIVE only)
    pub fn shift_type(&self) -> Option<ShiftType> {
        self.shift_type
    }

    /// End of the current shift (ACTIVE only)
    pub fn end_of_shift(&self) -> Option<SimTime> {
        self.end_of_shift
    }

    pub fn patients(&self) -> &BTreeSet<PatientId> {
        &self.patients
    }

    /// When the last completed shift ended; `None` if never worked
    pub fn last_shift_end(&self) -> Option<SimTime> {
        self.last_shift_end
    }
}

static NO_STAFF: BTreeSet<StaffId> = BTreeSet::new();

/// Staff lifecycle plus the staff↔patient assignment graph
///
/// # Example
///
/// ```rust
/// use hospital_sim_core::{PatientId, ShiftType, StaffForce, StaffId, StaffState};
///
/// let mut staff = StaffForce::with_available([StaffId(1)]);
/// staff.start_shift(StaffId(1), ShiftType::Day, 720.0).unwrap();
/// staff.assign(StaffId(1), PatientId(10)).unwrap();
///
/// let orphans = staff.make_unavailable(StaffId(1), 720.0).unwrap();
/// assert!(orphans.contains(&PatientId(10)));
/// assert_eq!(staff.state_of(StaffId(1)).unwrap(), StaffState::Unavailable);
/// assert!(staff.staff_of(PatientId(10)).is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaffForce {
    records: BTreeMap<StaffId, StaffRecord>,
    patient_to_staff: BTreeMap<PatientId, BTreeSet<StaffId>>,
}

impl StaffForce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a force whose members all start AVAILABLE
    pub fn with_available(ids: impl IntoIterator<Item = StaffId>) -> Self {
        let records = ids
            .into_iter()
            .map(|sid| (sid, StaffRecord::available()))
            .collect();
        Self {
            records,
            patient_to_staff: BTreeMap::new(),
        }
    }

    /// Register a new AVAILABLE member
    pub fn add_staff(&mut self, sid: StaffId) -> Result<(), Anomaly> {
        if self.records.contains_key(&sid) {
            return Err(Anomaly::DuplicateStaff(sid));
        }
        self.records.insert(sid, StaffRecord::available());
        Ok(())
    }

    pub fn record(&self, sid: StaffId) -> Result<&StaffRecord, ConsistencyError> {
        self.records
            .get(&sid)
            .ok_or(ConsistencyError::UnknownStaff(sid))
    }

    fn record_mut(&mut self, sid: StaffId) -> Result<&mut StaffRecord, ConsistencyError> {
        self.records
            .get_mut(&sid)
            .ok_or(ConsistencyError::UnknownStaff(sid))
    }

    pub fn state_of(&self, sid: StaffId) -> Result<StaffState, ConsistencyError> {
        Ok(self.record(sid)?.state)
    }

    // ========================================================================
    // Lifecycle transitions
    // ========================================================================

    /// AVAILABLE → ACTIVE
    pub fn start_shift(
        &mut self,
        sid: StaffId,
        shift_type: ShiftType,
        eos: SimTime,
    ) -> Result<(), ConsistencyError> {
        let record = self.record_mut(sid)?;
        if record.state != StaffState::Available {
            return Err(ConsistencyError::InvalidTransition {
                staff: sid,
                from: record.state,
                action: "start shift",
            });
        }
        record.state = StaffState::Active;
        record.shift_type = Some(shift_type);
        record.end_of_shift = Some(eos);
        Ok(())
    }

    /// ACTIVE → UNAVAILABLE
    ///
    /// Unassigns every held patient on both sides of the graph and returns
    /// them as orphans.
    pub fn make_unavailable(
        &mut self,
        sid: StaffId,
        time: SimTime,
    ) -> Result<BTreeSet<PatientId>, ConsistencyError> {
        let record = self.record_mut(sid)?;
        if record.state != StaffState::Active {
            return Err(ConsistencyError::InvalidTransition {
                staff: sid,
                from: record.state,
                action: "end shift",
            });
        }
        let orphans = std::mem::take(&mut record.patients);
        record.state = StaffState::Unavailable;
        record.shift_type = None;
        record.end_of_shift = None;
        record.last_shift_end = Some(time);

        for pid in &orphans {
            self.drop_reverse_edge(sid, *pid)?;
        }
        Ok(orphans)
    }

    /// UNAVAILABLE → AVAILABLE
    pub fn make_available(&mut self, sid: StaffId) -> Result<(), ConsistencyError> {
        let record = self.record_mut(sid)?;
        if record.state != StaffState::Unavailable {
            return Err(ConsistencyError::InvalidTransition {
                staff: sid,
                from: record.state,
                action: "become available",
            });
        }
        record.state = StaffState::Available;
        Ok(())
    }

    // ========================================================================
    // Assignment graph
    // ========================================================================

    /// Add the edge `sid - pid`
    ///
    /// Returns `false` if the edge already existed.
    pub fn assign(&mut self, sid: StaffId, pid: PatientId) -> Result<bool, ConsistencyError> {
        let record = self.record_mut(sid)?;
        if record.state != StaffState::Active {
            return Err(ConsistencyError::StaffNotActive {
                staff: sid,
                state: record.state,
            });
        }
        let added = record.patients.insert(pid);
        self.patient_to_staff.entry(pid).or_default().insert(sid);
        Ok(added)
    }

    /// Remove the edge `sid - pid`
    pub fn unassign(&mut self, sid: StaffId, pid: PatientId) -> Result<(), ConsistencyError> {
        let record = self.record_mut(sid)?;
        if record.state != StaffState::Active {
            return Err(ConsistencyError::StaffNotActive {
                staff: sid,
                state: record.state,
            });
        }
        if !record.patients.remove(&pid) {
            return Err(ConsistencyError::NotAssigned {
                staff: sid,
                patient: pid,
            });
        }
        self.drop_reverse_edge(sid, pid)
    }

    /// Tear down every edge of a departing patient
    ///
    /// Returns the staff members that were caring for it. A patient with no
    /// edges yields an empty set.
    pub fn remove_patient(&mut self, pid: PatientId) -> Result<BTreeSet<StaffId>, ConsistencyError> {
        let holders = self.patient_to_staff.remove(&pid).unwrap_or_default();
        for sid in &holders {
            let record = self.record_mut(*sid)?;
            if !record.patients.remove(&pid) {
                return Err(ConsistencyError::AsymmetricAssignment {
                    staff: *sid,
                    patient: pid,
                });
            }
        }
        Ok(holders)
    }

    fn drop_reverse_edge(&mut self, sid: StaffId, pid: PatientId) -> Result<(), ConsistencyError> {
        let removed = match self.patient_to_staff.get_mut(&pid) {
            Some(staff) => {
                let removed = staff.remove(&sid);
                if staff.is_empty() {
                    self.patient_to_staff.remove(&pid);
                }
                removed
            }
            None => false,
        };
        if !removed {
            return Err(ConsistencyError::AsymmetricAssignment {
                staff: sid,
                patient: pid,
            });
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn patients_of(&self, sid: StaffId) -> Result<&BTreeSet<PatientId>, ConsistencyError> {
        Ok(&self.record(sid)?.patients)
    }

    pub fn staff_of(&self, pid: PatientId) -> &BTreeSet<StaffId> {
        self.patient_to_staff.get(&pid).unwrap_or(&NO_STAFF)
    }

    /// Number of patients held (0 for unknown or off-duty members)
    pub fn load(&self, sid: StaffId) -> usize {
        self.records
            .get(&sid)
            .map(|record| record.patients.len())
            .unwrap_or(0)
    }

    pub fn end_of_shift(&self, sid: StaffId) -> Option<SimTime> {
        self.records.get(&sid).and_then(|record| record.end_of_shift)
    }

    pub fn last_shift_end(&self, sid: StaffId) -> Option<SimTime> {
        self.records.get(&sid).and_then(|record| record.last_shift_end)
    }

    fn in_state(&self, state: StaffState) -> impl Iterator<Item = StaffId> + '_ {
        self.records
            .iter()
            .filter(move |(_, record)| record.state == state)
            .map(|(sid, _)| *sid)
    }

    /// ACTIVE members in ascending id order
    pub fn active_staff(&self) -> Vec<StaffId> {
        self.in_state(StaffState::Active).collect()
    }

    /// AVAILABLE members in ascending id order
    pub fn available_staff(&self) -> Vec<StaffId> {
        self.in_state(StaffState::Available).collect()
    }

    /// UNAVAILABLE members in ascending id order
    pub fn unavailable_staff(&self) -> Vec<StaffId> {
        self.in_state(StaffState::Unavailable).collect()
    }

    pub fn num_active(&self) -> usize {
        self.in_state(StaffState::Active).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Active member with the fewest patients (lowest id on ties)
    pub fn least_busy(&self) -> Option<StaffId> {
        self.in_state(StaffState::Active)
            .min_by_key(|sid| (self.load(*sid), *sid))
    }

    /// Available member whose last shift ended earliest (lowest id on ties)
    ///
    /// Members that never worked a shift count as the most rested.
    pub fn most_rested(&self) -> Option<StaffId> {
        self.records
            .iter()
            .filter(|(_, record)| record.state == StaffState::Available)
            .min_by(|(a_id, a), (b_id, b)| {
                let a_end = a.last_shift_end.unwrap_or(SimTime::NEG_INFINITY);
                let b_end = b.last_shift_end.unwrap_or(SimTime::NEG_INFINITY);
                a_end.total_cmp(&b_end).then(a_id.cmp(b_id))
            })
            .map(|(sid, _)| *sid)
    }

    /// Check that both sides of the assignment graph mirror each other and
    /// that only active members hold patients
    pub fn verify_symmetry(&self) -> Result<(), ConsistencyError> {
        let mut forward_edges = 0;
        for (sid, record) in &self.records {
            if record.state != StaffState::Active && !record.patients.is_empty() {
                return Err(ConsistencyError::StaffNotActive {
                    staff: *sid,
                    state: record.state,
                });
            }
            for pid in &record.patients {
                if !self.staff_of(*pid).contains(sid) {
                    return Err(ConsistencyError::AsymmetricAssignment {
                        staff: *sid,
                        patient: *pid,
                    });
                }
                forward_edges += 1;
            }
        }

        let mut reverse_edges = 0;
        for (pid, staff) in &self.patient_to_staff {
            for sid in staff {
                let held = self
                    .records
                    .get(sid)
                    .map(|record| record.patients.contains(pid))
                    .unwrap_or(false);
                if !held {
                    return Err(ConsistencyError::AsymmetricAssignment {
                        staff: *sid,
                        patient: *pid,
                    });
                }
                reverse_edges += 1;
            }
        }
        debug_assert_eq!(forward_edges, reverse_edges);
        Ok(())
    }
}
