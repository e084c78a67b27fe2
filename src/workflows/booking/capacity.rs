use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::domain::{BedCapacity, LocationId, ShelterLocation};

/// Errors raised by capacity accounting.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("shelter location {0} is not registered")]
    UnknownLocation(LocationId),
    #[error("requested {requested} beds but only {available} are available")]
    InsufficientCapacity { requested: u32, available: u32 },
    #[error("{operation} of {requested} beds exceeds the {held} currently held")]
    InvalidTransition {
        operation: &'static str,
        requested: u32,
        held: u32,
    },
}

/// Read-only counter view exposed to callers and dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacitySnapshot {
    pub total: u32,
    pub available: u32,
    pub reserved: u32,
    pub occupied: u32,
    pub is_available: bool,
}

impl From<BedCapacity> for CapacitySnapshot {
    fn from(capacity: BedCapacity) -> Self {
        Self {
            total: capacity.total,
            available: capacity.available,
            reserved: capacity.reserved,
            occupied: capacity.occupied,
            is_available: capacity.available > 0,
        }
    }
}

impl BedCapacity {
    /// `available -= beds; reserved += beds`, guarded against overdraw.
    pub fn reserve(&mut self, beds: u32) -> Result<(), LedgerError> {
        if self.available < beds {
            return Err(LedgerError::InsufficientCapacity {
                requested: beds,
                available: self.available,
            });
        }
        self.available -= beds;
        self.reserved += beds;
        Ok(())
    }

    /// `reserved -= beds; occupied += beds`; the beds must already be reserved.
    pub fn check_in(&mut self, beds: u32) -> Result<(), LedgerError> {
        if self.reserved < beds {
            return Err(LedgerError::InvalidTransition {
                operation: "check-in",
                requested: beds,
                held: self.reserved,
            });
        }
        self.reserved -= beds;
        self.occupied += beds;
        Ok(())
    }

    /// `occupied -= beds; available += beds`.
    pub fn check_out(&mut self, beds: u32) -> Result<(), LedgerError> {
        if self.occupied < beds {
            return Err(LedgerError::InvalidTransition {
                operation: "check-out",
                requested: beds,
                held: self.occupied,
            });
        }
        self.occupied -= beds;
        self.available += beds;
        Ok(())
    }

    /// `reserved -= beds; available += beds`, for bookings aborted before check-in.
    pub fn release(&mut self, beds: u32) -> Result<(), LedgerError> {
        if self.reserved < beds {
            return Err(LedgerError::InvalidTransition {
                operation: "release",
                requested: beds,
                held: self.reserved,
            });
        }
        self.reserved -= beds;
        self.available += beds;
        Ok(())
    }
}

/// Bed accounting per shelter location.
///
/// Every mutation must execute as a single atomic read-modify-write against
/// the location's record: two racing `reserve` calls must never jointly
/// overdraw `available`, and a failed guard must leave the counters untouched.
pub trait CapacityLedger: Send + Sync {
    fn reserve(&self, location: &LocationId, beds: u32) -> Result<CapacitySnapshot, LedgerError>;
    fn check_in(&self, location: &LocationId, beds: u32) -> Result<CapacitySnapshot, LedgerError>;
    fn check_out(&self, location: &LocationId, beds: u32)
        -> Result<CapacitySnapshot, LedgerError>;
    fn release(&self, location: &LocationId, beds: u32) -> Result<CapacitySnapshot, LedgerError>;
    /// Read-only counter query.
    fn capacity_of(&self, location: &LocationId) -> Result<CapacitySnapshot, LedgerError>;
    /// Full location snapshot for match evaluation.
    fn location(&self, location: &LocationId) -> Result<ShelterLocation, LedgerError>;
}

/// Mutex-backed ledger holding the location records themselves.
#[derive(Default)]
pub struct InMemoryCapacityLedger {
    locations: Mutex<HashMap<LocationId, ShelterLocation>>,
}

impl InMemoryCapacityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Administrative registration; replaces any record with the same id.
    pub fn register(&self, location: ShelterLocation) {
        let mut guard = self.locations.lock().expect("ledger mutex poisoned");
        guard.insert(location.id.clone(), location);
    }

    /// Soft-deactivate: the location stops accepting placements but keeps its
    /// counters for bookings already referencing it.
    pub fn deactivate(&self, location: &LocationId) -> Result<(), LedgerError> {
        let mut guard = self.locations.lock().expect("ledger mutex poisoned");
        let record = guard
            .get_mut(location)
            .ok_or_else(|| LedgerError::UnknownLocation(location.clone()))?;
        record.accepting_placements = false;
        Ok(())
    }

    fn mutate(
        &self,
        location: &LocationId,
        apply: impl FnOnce(&mut BedCapacity) -> Result<(), LedgerError>,
    ) -> Result<CapacitySnapshot, LedgerError> {
        let mut guard = self.locations.lock().expect("ledger mutex poisoned");
        let record = guard
            .get_mut(location)
            .ok_or_else(|| LedgerError::UnknownLocation(location.clone()))?;
        apply(&mut record.capacity)?;
        debug_assert!(record.capacity.is_balanced());
        Ok(record.capacity.into())
    }
}

impl CapacityLedger for InMemoryCapacityLedger {
    fn reserve(&self, location: &LocationId, beds: u32) -> Result<CapacitySnapshot, LedgerError> {
        self.mutate(location, |capacity| capacity.reserve(beds))
    }

    fn check_in(&self, location: &LocationId, beds: u32) -> Result<CapacitySnapshot, LedgerError> {
        self.mutate(location, |capacity| capacity.check_in(beds))
    }

    fn check_out(
        &self,
        location: &LocationId,
        beds: u32,
    ) -> Result<CapacitySnapshot, LedgerError> {
        self.mutate(location, |capacity| capacity.check_out(beds))
    }

    fn release(&self, location: &LocationId, beds: u32) -> Result<CapacitySnapshot, LedgerError> {
        self.mutate(location, |capacity| capacity.release(beds))
    }

    fn capacity_of(&self, location: &LocationId) -> Result<CapacitySnapshot, LedgerError> {
        let guard = self.locations.lock().expect("ledger mutex poisoned");
        guard
            .get(location)
            .map(|record| record.capacity.into())
            .ok_or_else(|| LedgerError::UnknownLocation(location.clone()))
    }

    fn location(&self, location: &LocationId) -> Result<ShelterLocation, LedgerError> {
        let guard = self.locations.lock().expect("ledger mutex poisoned");
        guard
            .get(location)
            .cloned()
            .ok_or_else(|| LedgerError::UnknownLocation(location.clone()))
    }
}
