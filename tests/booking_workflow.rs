//! Integration specifications for the safehouse booking workflow.
//!
//! Scenarios run end-to-end through the public service facade with in-memory
//! collaborators, so capacity accounting, matching, and the state machine are
//! validated without reaching into private modules.

mod common {
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;

    use haven_booking::workflows::booking::{
        BedCapacity, BookingEvent, BookingRequest, BookingWorkflowService, EventPublisher,
        GeoPoint, InMemoryBookingRepository, InMemoryCapacityLedger, InMemorySessionStore,
        LocationId, MatchConfig, PublishError, RequesterIdentity, ResourceAvailability,
        SecurityLevel, ShelterLocation,
    };

    pub(super) fn harbor_id() -> LocationId {
        LocationId("loc-harbor".to_string())
    }

    pub(super) fn location(total_beds: u32) -> ShelterLocation {
        ShelterLocation {
            id: harbor_id(),
            name: "Harbor Lights House".to_string(),
            capacity: BedCapacity::vacant(total_beds),
            resources: ResourceAvailability::full(),
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
            requested_check_out: Some(
                NaiveDate::from_ymd_opt(2026, 3, 16).expect("valid date"),
            ),
            number_of_guests: guests,
            special_needs: Vec::new(),
            accessibility_needs: Vec::new(),
            transportation_required: false,
            pickup_location: None,
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

    pub(super) type Service = BookingWorkflowService<
        InMemoryCapacityLedger,
        InMemoryBookingRepository,
        InMemorySessionStore,
        RecordingPublisher,
    >;

    pub(super) fn build_service(
        total_beds: u32,
    ) -> (Service, Arc<InMemoryCapacityLedger>, Arc<RecordingPublisher>) {
        let ledger = Arc::new(InMemoryCapacityLedger::new());
        ledger.register(location(total_beds));
        let bookings = Arc::new(InMemoryBookingRepository::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let events = Arc::new(RecordingPublisher::default());

        let service = BookingWorkflowService::new(
            ledger.clone(),
            bookings,
            sessions,
            events.clone(),
            MatchConfig::default(),
        );

        (service, ledger, events)
    }
}

mod scenarios {
    use super::common::*;
    use haven_booking::workflows::booking::{
        BookingStatus, BookingWorkflowError, LedgerError,
    };

    #[test]
    fn a_matching_party_of_three_reserves_three_beds() {
        let (service, _, _) = build_service(10);

        let booking = service
            .create_reservation(request(3))
            .expect("no unmet needs on a full-resource location");

        assert_eq!(booking.status, BookingStatus::Pending);
        let snapshot = service.availability(&harbor_id()).expect("location known");
        assert_eq!(snapshot.available, 7);
        assert_eq!(snapshot.reserved, 3);
    }

    #[test]
    fn an_oversized_party_is_turned_away_with_counters_untouched() {
        let (service, _, _) = build_service(10);
        service
            .create_reservation(request(3))
            .expect("first placement succeeds");

        match service.create_reservation(request(8)) {
            Err(BookingWorkflowError::Ledger(LedgerError::InsufficientCapacity {
                requested: 8,
                available: 7,
            })) => {}
            other => panic!("expected insufficient capacity, got {other:?}"),
        }

        let snapshot = service.availability(&harbor_id()).expect("location known");
        assert_eq!(snapshot.available, 7);
        assert_eq!(snapshot.reserved, 3);
        assert_eq!(snapshot.occupied, 0);
    }

    #[test]
    fn cancellation_restores_the_full_house() {
        let (service, _, _) = build_service(10);
        let booking = service
            .create_reservation(request(3))
            .expect("placement succeeds");

        service.cancel(&booking.id).expect("pending can cancel");

        let snapshot = service.availability(&harbor_id()).expect("location known");
        assert_eq!(snapshot.available, 10);
        assert_eq!(snapshot.reserved, 0);
    }

    #[test]
    fn a_full_stay_returns_every_bed() {
        let (service, _, events) = build_service(10);
        let booking = service
            .create_reservation(request(3))
            .expect("placement succeeds");

        service
            .approve(&booking.id, "counselor-7".to_string())
            .expect("approve");
        service.check_in(&booking.id).expect("check in");

        let snapshot = service.availability(&harbor_id()).expect("location known");
        assert_eq!(snapshot.reserved, 0);
        assert_eq!(snapshot.occupied, 3);

        service.check_out(&booking.id).expect("check out");

        let snapshot = service.availability(&harbor_id()).expect("location known");
        assert_eq!(snapshot.occupied, 0);
        assert_eq!(snapshot.available, 10);

        let statuses: Vec<_> = events
            .events()
            .iter()
            .map(|event| event.to_status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                BookingStatus::Pending,
                BookingStatus::Approved,
                BookingStatus::CheckedIn,
                BookingStatus::CheckedOut,
            ]
        );
    }

    #[test]
    fn one_unmet_need_scores_eighty_five_but_still_matches() {
        use haven_booking::workflows::booking::{
            MatchConfig, ResourceAvailability, SafetyMatchEvaluator, SupportService,
        };

        let mut house = location(10);
        house.resources = ResourceAvailability {
            medical: false,
            ..ResourceAvailability::full()
        };
        let mut medical_request = request(2);
        medical_request.special_needs = vec![SupportService::Medical];

        let evaluator = SafetyMatchEvaluator::new(MatchConfig::default());
        let outcome = evaluator.evaluate(&medical_request, &house);

        assert_eq!(outcome.safety_score, 85);
        assert!(outcome.is_match, "score alone does not fail the match");

        // the capacity gate still applies separately
        let mut oversized = medical_request.clone();
        oversized.number_of_guests = 12;
        let gated = evaluator.evaluate(&oversized, &house);
        assert_eq!(gated.safety_score, 85);
        assert!(!gated.is_match);
    }
}

mod concurrency {
    use std::sync::Arc;
    use std::thread;

    use super::common::*;
    use haven_booking::workflows::booking::{BookingWorkflowError, LedgerError};

    #[test]
    fn concurrent_reservations_never_overbook() {
        let (service, _, _) = build_service(10);
        let service = Arc::new(service);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                thread::spawn(move || service.create_reservation(request(2)))
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("handler thread"))
            .collect();

        let successes = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(successes, 5, "exactly ten of the sixteen requested beds exist");

        for result in &results {
            if let Err(err) = result {
                assert!(
                    matches!(
                        err,
                        BookingWorkflowError::Ledger(LedgerError::InsufficientCapacity { .. })
                    ),
                    "losers must see the capacity error, got {err:?}"
                );
            }
        }

        let snapshot = service.availability(&harbor_id()).expect("location known");
        assert_eq!(snapshot.available, 0);
        assert_eq!(snapshot.reserved, 10);
        assert_eq!(
            snapshot.available + snapshot.reserved + snapshot.occupied,
            snapshot.total
        );
    }

    #[test]
    fn racing_aborts_and_reservations_keep_the_invariant() {
        let (service, _, _) = build_service(12);
        let service = Arc::new(service);

        // seed six bookings of two beds each
        let ids: Vec<_> = (0..6)
            .map(|_| {
                service
                    .create_reservation(request(2))
                    .expect("seed placement")
                    .id
            })
            .collect();

        let handles: Vec<_> = ids
            .into_iter()
            .enumerate()
            .map(|(index, id)| {
                let service = Arc::clone(&service);
                thread::spawn(move || {
                    if index % 2 == 0 {
                        service.cancel(&id).map(|_| ())
                    } else {
                        service
                            .approve(&id, "counselor-7".to_string())
                            .and_then(|_| service.check_in(&id))
                            .map(|_| ())
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("transition thread").expect("transition");
        }

        let snapshot = service.availability(&harbor_id()).expect("location known");
        assert_eq!(snapshot.reserved, 0);
        assert_eq!(snapshot.occupied, 6);
        assert_eq!(snapshot.available, 6);
        assert_eq!(
            snapshot.available + snapshot.reserved + snapshot.occupied,
            snapshot.total
        );
    }
}

mod ledger {
    use super::common::*;
    use haven_booking::workflows::booking::CapacityLedger;

    #[test]
    fn reserve_then_release_is_a_round_trip() {
        let (_, ledger, _) = build_service(10);
        let before = ledger.capacity_of(&harbor_id()).expect("location known");

        ledger.reserve(&harbor_id(), 4).expect("reserve");
        ledger.release(&harbor_id(), 4).expect("release");

        let after = ledger.capacity_of(&harbor_id()).expect("location known");
        assert_eq!(before, after);
    }
}

mod terminal {
    use super::common::*;
    use haven_booking::workflows::booking::{BookingStatus, BookingWorkflowError};

    #[test]
    fn rejected_and_cancelled_bookings_are_frozen() {
        let (service, _, _) = build_service(10);

        let rejected = service
            .create_reservation(request(2))
            .expect("placement succeeds");
        service.reject(&rejected.id).expect("pending can reject");

        let cancelled = service
            .create_reservation(request(2))
            .expect("placement succeeds");
        service.cancel(&cancelled.id).expect("pending can cancel");

        for id in [&rejected.id, &cancelled.id] {
            assert!(matches!(
                service.approve(id, "counselor-7".to_string()),
                Err(BookingWorkflowError::InvalidTransition { .. })
            ));
            assert!(matches!(
                service.check_in(id),
                Err(BookingWorkflowError::InvalidTransition { .. })
            ));
            assert!(matches!(
                service.cancel(id),
                Err(BookingWorkflowError::InvalidTransition { .. })
            ));
        }

        assert_eq!(
            service.booking(&rejected.id).expect("still readable").status,
            BookingStatus::Rejected
        );
        assert_eq!(
            service.booking(&cancelled.id).expect("still readable").status,
            BookingStatus::Cancelled
        );
    }
}
