use std::collections::HashMap;
use std::sync::Mutex;

use super::domain::{Booking, BookingId, LocationId};

/// Storage abstraction so the workflow service can be exercised in isolation.
pub trait BookingRepository: Send + Sync {
    fn insert(&self, booking: Booking) -> Result<Booking, RepositoryError>;
    fn update(&self, booking: Booking) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError>;
    /// Non-terminal bookings at one location, for counselor dashboards.
    fn active_for_location(&self, location: &LocationId) -> Result<Vec<Booking>, RepositoryError>;
}

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Map-backed store used by the demo binary and tests.
#[derive(Default)]
pub struct InMemoryBookingRepository {
    records: Mutex<HashMap<BookingId, Booking>>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookingRepository for InMemoryBookingRepository {
    fn insert(&self, booking: Booking) -> Result<Booking, RepositoryError> {
        let mut guard = self.records.lock().expect("booking store mutex poisoned");
        if guard.contains_key(&booking.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(booking.id.clone(), booking.clone());
        Ok(booking)
    }

    fn update(&self, booking: Booking) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("booking store mutex poisoned");
        if !guard.contains_key(&booking.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(booking.id.clone(), booking);
        Ok(())
    }

    fn fetch(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let guard = self.records.lock().expect("booking store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn active_for_location(&self, location: &LocationId) -> Result<Vec<Booking>, RepositoryError> {
        let guard = self.records.lock().expect("booking store mutex poisoned");
        Ok(guard
            .values()
            .filter(|booking| booking.location_id == *location && !booking.status.is_terminal())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::workflows::booking::domain::{BookingStatus, RequesterIdentity};

    fn booking(id: &str, status: BookingStatus) -> Booking {
        Booking {
            id: BookingId(id.to_string()),
            location_id: LocationId("loc-harbor".to_string()),
            requester: RequesterIdentity::Registered {
                user_id: "user-41".to_string(),
            },
            requested_check_in: NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date"),
            requested_check_out: None,
            number_of_guests: 2,
            special_needs: Vec::new(),
            accessibility_needs: Vec::new(),
            transportation_required: false,
            pickup_location: None,
            transportation: None,
            workflow_step: 1,
            needs_assessment: None,
            support_services: None,
            status,
            created_at: Utc::now(),
            approved_by: None,
            approved_at: None,
            checked_in_at: None,
            checked_out_at: None,
        }
    }

    #[test]
    fn duplicate_inserts_conflict() {
        let store = InMemoryBookingRepository::new();
        store
            .insert(booking("bk-1", BookingStatus::Pending))
            .expect("first insert");

        assert!(matches!(
            store.insert(booking("bk-1", BookingStatus::Pending)),
            Err(RepositoryError::Conflict)
        ));
    }

    #[test]
    fn updating_an_unknown_booking_is_not_found() {
        let store = InMemoryBookingRepository::new();

        assert!(matches!(
            store.update(booking("bk-ghost", BookingStatus::Pending)),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn active_listing_skips_terminal_bookings() {
        let store = InMemoryBookingRepository::new();
        store
            .insert(booking("bk-1", BookingStatus::Pending))
            .expect("insert");
        store
            .insert(booking("bk-2", BookingStatus::CheckedIn))
            .expect("insert");
        store
            .insert(booking("bk-3", BookingStatus::Cancelled))
            .expect("insert");
        store
            .insert(booking("bk-4", BookingStatus::CheckedOut))
            .expect("insert");

        let active = store
            .active_for_location(&LocationId("loc-harbor".to_string()))
            .expect("listing");

        let mut ids: Vec<_> = active.iter().map(|record| record.id.0.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["bk-1", "bk-2"]);
    }
}
