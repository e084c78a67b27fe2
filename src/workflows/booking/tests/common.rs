use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};

use crate::workflows::booking::capacity::InMemoryCapacityLedger;
use crate::workflows::booking::domain::{
    BedCapacity, BookingRequest, GeoPoint, LocationId, NeedsAssessment, RequesterIdentity,
    ResourceAvailability, SecurityLevel, ShelterLocation,
};
use crate::workflows::booking::events::{BookingEvent, EventPublisher, PublishError};
use crate::workflows::booking::matching::MatchConfig;
use crate::workflows::booking::repository::InMemoryBookingRepository;
use crate::workflows::booking::service::BookingWorkflowService;
use crate::workflows::booking::sessions::InMemorySessionStore;

pub(super) const HARBOR: &str = "loc-harbor";

pub(super) fn harbor_id() -> LocationId {
    LocationId(HARBOR.to_string())
}

pub(super) fn location(total_beds: u32) -> ShelterLocation {
    location_with_resources(total_beds, ResourceAvailability::full())
}

pub(super) fn location_with_resources(
    total_beds: u32,
    resources: ResourceAvailability,
) -> ShelterLocation {
    ShelterLocation {
        id: harbor_id(),
        name: "Harbor Lights House".to_string(),
        capacity: BedCapacity::vacant(total_beds),
        resources,
        security_level: SecurityLevel::High,
        accessibility_features: vec!["wheelchair access".to_string()],
        coordinates: GeoPoint {
            latitude: 41.5868,
            longitude: -93.625,
        },
        auto_approve: false,
        accepting_placements: true,
    }
}

pub(super) fn request(guests: u32) -> BookingRequest {
    BookingRequest {
        location_id: harbor_id(),
        requester: RequesterIdentity::Registered {
            user_id: "user-41".to_string(),
        },
        requested_check_in: NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date"),
        requested_check_out: Some(NaiveDate::from_ymd_opt(2026, 3, 16).expect("valid date")),
        number_of_guests: guests,
        special_needs: Vec::new(),
        accessibility_needs: Vec::new(),
        transportation_required: false,
        pickup_location: None,
    }
}

pub(super) fn assessment() -> NeedsAssessment {
    let mut responses = BTreeMap::new();
    responses.insert("immediate_danger".to_string(), "no".to_string());

    NeedsAssessment {
        assessed_by: "counselor-7".to_string(),
        assessed_at: Utc::now(),
        summary: "Initial intake complete".to_string(),
        responses,
        follow_up_required: false,
    }
}

#[derive(Default)]
pub(super) struct RecordingPublisher {
    events: Mutex<Vec<BookingEvent>>,
}

impl RecordingPublisher {
    pub(super) fn events(&self) -> Vec<BookingEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: BookingEvent) -> Result<(), PublishError> {
        self.events
            .lock()
            .expect("event mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub(super) type TestService = BookingWorkflowService<
    InMemoryCapacityLedger,
    InMemoryBookingRepository,
    InMemorySessionStore,
    RecordingPublisher,
>;

pub(super) fn build_stack(total_beds: u32) -> (
    TestService,
    Arc<InMemoryCapacityLedger>,
    Arc<InMemorySessionStore>,
    Arc<RecordingPublisher>,
) {
    build_stack_at(location(total_beds))
}

pub(super) fn build_stack_at(house: ShelterLocation) -> (
    TestService,
    Arc<InMemoryCapacityLedger>,
    Arc<InMemorySessionStore>,
    Arc<RecordingPublisher>,
) {
    let ledger = Arc::new(InMemoryCapacityLedger::new());
    ledger.register(house);
    let bookings = Arc::new(InMemoryBookingRepository::new());
    let sessions = Arc::new(InMemorySessionStore::new());
    let events = Arc::new(RecordingPublisher::default());

    let service = BookingWorkflowService::new(
        ledger.clone(),
        bookings,
        sessions.clone(),
        events.clone(),
        MatchConfig::default(),
    );

    (service, ledger, sessions, events)
}
