//! Capacity-bounded resources
//!
//! A pool tracks which patients currently hold one unit of a resource.
//! `assign` never re-validates capacity: admission decisions check
//! [`ResourcePool::available`] first, and the kernel's invariant check
//! catches any caller that does not.

use crate::models::error::ConsistencyError;
use crate::models::patient::PatientId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Scarce resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Bed,
    Ventilator,
}

/// Holder set for one resource type
#[derive(Debug, Clone)]
pub struct ResourcePool {
    kind: ResourceKind,
    capacity: usize,
    holders: BTreeSet<PatientId>,
}

impl ResourcePool {
    pub fn new(kind: ResourceKind, capacity: usize) -> Self {
        Self {
            kind,
            capacity,
            holders: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of units in use
    pub fn used(&self) -> usize {
        self.holders.len()
    }

    /// At least one free unit
    pub fn available(&self) -> bool {
        self.capacity > self.holders.len()
    }

    pub fn holds(&self, pid: PatientId) -> bool {
        self.holders.contains(&pid)
    }

    pub fn holders(&self) -> &BTreeSet<PatientId> {
        &self.holders
    }

    /// Give one unit to `pid` (caller has checked availability)
    pub fn assign(&mut self, pid: PatientId) {
        self.holders.insert(pid);
    }

    /// Take the unit back from `pid`
    ///
    /// Returns whether a unit was actually released. An absent holder is an
    /// error only in strict mode.
    pub fn release(&mut self, pid: PatientId, strict: bool) -> Result<bool, ConsistencyError> {
        if self.holders.remove(&pid) {
            return Ok(true);
        }
        if strict {
            return Err(ConsistencyError::ResourceNotHeld {
                resource: self.kind,
                patient: pid,
            });
        }
        Ok(false)
    }

    /// Check `|holders| <= capacity`
    pub fn verify_capacity(&self) -> Result<(), ConsistencyError> {
        if self.holders.len() > self.capacity {
            return Err(ConsistencyError::CapacityExceeded {
                resource: self.kind,
                holders: self.holders.len(),
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}

/// Beds and ventilators of the facility
#[derive(Debug, Clone)]
pub struct ResourceState {
    pub beds: ResourcePool,
    pub ventilators: ResourcePool,
}

impl ResourceState {
    pub fn new(beds: usize, ventilators: usize) -> Self {
        Self {
            beds: ResourcePool::new(ResourceKind::Bed, beds),
            ventilators: ResourcePool::new(ResourceKind::Ventilator, ventilators),
        }
    }

    pub fn num_beds_used(&self) -> usize {
        self.beds.used()
    }

    pub fn num_vented(&self) -> usize {
        self.ventilators.used()
    }

    pub fn bed_available(&self) -> bool {
        self.beds.available()
    }

    pub fn vent_available(&self) -> bool {
        self.ventilators.available()
    }

    pub fn pool(&self, kind: ResourceKind) -> &ResourcePool {
        match kind {
            ResourceKind::Bed => &self.beds,
            ResourceKind::Ventilator => &self.ventilators,
        }
    }

    pub fn verify_capacity(&self) -> Result<(), ConsistencyError> {
        self.beds.verify_capacity()?;
        self.ventilators.verify_capacity()
    }
}
