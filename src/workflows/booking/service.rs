use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};

use super::capacity::{CapacityLedger, CapacitySnapshot, LedgerError};
use super::domain::{
    step, Booking, BookingId, BookingRequest, BookingStatus, GeoPoint, LocationId,
    NeedsAssessment, RequesterIdentity, SessionId, SupportService, SupportServicesRecord,
    TransportStatus,
};
use super::events::{BookingEvent, EventPublisher, PublishError};
use super::matching::{MatchConfig, SafetyMatchEvaluator};
use super::repository::{BookingRepository, RepositoryError};
use super::sessions::SessionRepository;
use super::transport;

/// Actor recorded when a location's policy approves a booking without staff
/// involvement.
const POLICY_APPROVER: &str = "shelter-policy";

static BOOKING_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_booking_id() -> BookingId {
    let id = BOOKING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    BookingId(format!("bk-{id:06}"))
}

/// Error raised by the booking workflow.
#[derive(Debug, thiserror::Error)]
pub enum BookingWorkflowError {
    #[error("invalid booking request: {0}")]
    InvalidRequest(&'static str),
    #[error("location {location} cannot take this placement (safety score {safety_score})")]
    SafetyMismatch {
        location: LocationId,
        safety_score: i16,
        reasons: Vec<String>,
    },
    #[error("booking {booking} cannot {operation} while {status}")]
    InvalidTransition {
        booking: BookingId,
        operation: &'static str,
        status: BookingStatus,
    },
    #[error("anonymous session {0} is not registered")]
    UnknownSession(SessionId),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Orchestrates the placement lifecycle, mutating the capacity ledger only at
/// the transitions the workflow defines and publishing every status change.
pub struct BookingWorkflowService<L, R, S, N> {
    ledger: Arc<L>,
    bookings: Arc<R>,
    sessions: Arc<S>,
    events: Arc<N>,
    evaluator: SafetyMatchEvaluator,
}

impl<L, R, S, N> BookingWorkflowService<L, R, S, N>
where
    L: CapacityLedger + 'static,
    R: BookingRepository + 'static,
    S: SessionRepository + 'static,
    N: EventPublisher + 'static,
{
    pub fn new(
        ledger: Arc<L>,
        bookings: Arc<R>,
        sessions: Arc<S>,
        events: Arc<N>,
        config: MatchConfig,
    ) -> Self {
        Self {
            ledger,
            bookings,
            sessions,
            events,
            evaluator: SafetyMatchEvaluator::new(config),
        }
    }

    /// Workflow step 1: evaluate the safety match, reserve beds, and persist
    /// the pending booking. A failed match never touches the ledger; a failed
    /// persist hands the reserved beds back.
    pub fn create_reservation(
        &self,
        request: BookingRequest,
    ) -> Result<Booking, BookingWorkflowError> {
        validate_request(&request)?;

        if let RequesterIdentity::Anonymous { session_id } = &request.requester {
            self.sessions
                .get(session_id)?
                .ok_or_else(|| BookingWorkflowError::UnknownSession(session_id.clone()))?;
        }

        let location = self.ledger.location(&request.location_id)?;
        let outcome = self.evaluator.evaluate(&request, &location);
        if !outcome.is_match {
            debug!(
                location = %location.id,
                score = outcome.safety_score,
                "placement refused by safety match"
            );
            // When the needs are covered and only the bed count blocks the
            // placement, callers get the capacity error kind, not a mismatch.
            let meets_needs =
                outcome.safety_score >= self.evaluator.config().match_threshold;
            if meets_needs
                && location.accepting_placements
                && location.capacity.available < request.number_of_guests
            {
                return Err(LedgerError::InsufficientCapacity {
                    requested: request.number_of_guests,
                    available: location.capacity.available,
                }
                .into());
            }
            return Err(BookingWorkflowError::SafetyMismatch {
                location: location.id,
                safety_score: outcome.safety_score,
                reasons: outcome.reasons,
            });
        }

        let guests = request.number_of_guests;
        let location_id = request.location_id.clone();
        let capacity = self.ledger.reserve(&location_id, guests)?;

        let booking = Booking {
            id: next_booking_id(),
            location_id: request.location_id,
            requester: request.requester,
            requested_check_in: request.requested_check_in,
            requested_check_out: request.requested_check_out,
            number_of_guests: guests,
            special_needs: request.special_needs,
            accessibility_needs: request.accessibility_needs,
            transportation_required: request.transportation_required,
            pickup_location: request.pickup_location,
            transportation: None,
            workflow_step: step::RESERVATION,
            needs_assessment: None,
            support_services: None,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
            approved_by: None,
            approved_at: None,
            checked_in_at: None,
            checked_out_at: None,
        };

        let stored = match self.bookings.insert(booking) {
            Ok(stored) => stored,
            Err(err) => {
                if let Err(release_err) = self.ledger.release(&location_id, guests) {
                    error!(%release_err, "failed to release beds after aborted insert");
                }
                return Err(err.into());
            }
        };

        if let RequesterIdentity::Anonymous { session_id } = &stored.requester {
            if let Some(mut session) = self.sessions.get(session_id)? {
                session.bookings.push(stored.id.clone());
                self.sessions.put(session)?;
            }
        }

        info!(
            booking = %stored.id,
            location = %stored.location_id,
            guests = stored.number_of_guests,
            "reservation created"
        );
        self.publish(&stored, None, Some(capacity))?;

        if location.auto_approve {
            return self.approve(&stored.id, POLICY_APPROVER.to_string());
        }

        Ok(stored)
    }

    /// Workflow step 2; skipped entirely when the requester has their own
    /// transport. The pickup point may come with this call or from the
    /// original request.
    pub fn arrange_transportation(
        &self,
        booking_id: &BookingId,
        pickup: Option<GeoPoint>,
    ) -> Result<Booking, BookingWorkflowError> {
        let mut booking = self.fetch_booking(booking_id)?;
        if !booking.transportation_required {
            return Err(BookingWorkflowError::InvalidRequest(
                "transportation was not requested for this booking",
            ));
        }
        ensure_status(
            &booking,
            "arrange transportation",
            &[BookingStatus::Pending, BookingStatus::Approved],
        )?;

        let pickup = pickup
            .or(booking.pickup_location)
            .ok_or(BookingWorkflowError::InvalidRequest(
                "no pickup location on file for this booking",
            ))?;
        let location = self.ledger.location(&booking.location_id)?;
        let plan = transport::plan_pickup(pickup, location.coordinates, Utc::now());

        debug!(
            booking = %booking.id,
            distance_km = plan.distance_km,
            eta_minutes = plan.eta_minutes,
            "transportation scheduled"
        );

        booking.pickup_location = Some(pickup);
        booking.transportation = Some(plan);
        booking.workflow_step = booking.workflow_step.max(step::TRANSPORTATION);
        self.bookings.update(booking.clone())?;
        Ok(booking)
    }

    /// Workflow step 3: staff attach the needs assessment.
    pub fn record_intake(
        &self,
        booking_id: &BookingId,
        assessment: NeedsAssessment,
    ) -> Result<Booking, BookingWorkflowError> {
        let mut booking = self.fetch_booking(booking_id)?;
        ensure_status(
            &booking,
            "record intake",
            &[BookingStatus::Pending, BookingStatus::Approved],
        )?;

        booking.needs_assessment = Some(assessment);
        booking.workflow_step = booking.workflow_step.max(step::INTAKE);
        self.bookings.update(booking.clone())?;
        Ok(booking)
    }

    /// Workflow step 4: translate the requested service list into the
    /// activation record. No capacity effect.
    pub fn activate_support_services(
        &self,
        booking_id: &BookingId,
        services: &[SupportService],
    ) -> Result<Booking, BookingWorkflowError> {
        let mut booking = self.fetch_booking(booking_id)?;
        ensure_status(
            &booking,
            "activate support services",
            &[BookingStatus::Pending, BookingStatus::Approved],
        )?;

        booking.support_services = Some(SupportServicesRecord::activate(services, Utc::now()));
        booking.workflow_step = booking.workflow_step.max(step::SUPPORT_SERVICES);
        self.bookings.update(booking.clone())?;
        Ok(booking)
    }

    /// Workflow step 5, driven by an administrative actor or location policy.
    pub fn approve(
        &self,
        booking_id: &BookingId,
        approved_by: String,
    ) -> Result<Booking, BookingWorkflowError> {
        let mut booking = self.fetch_booking(booking_id)?;
        ensure_status(&booking, "approve", &[BookingStatus::Pending])?;

        let from = booking.status;
        booking.status = BookingStatus::Approved;
        booking.approved_by = Some(approved_by);
        booking.approved_at = Some(Utc::now());
        booking.workflow_step = booking.workflow_step.max(step::APPROVAL);
        self.bookings.update(booking.clone())?;

        info!(booking = %booking.id, "booking approved");
        self.publish(&booking, Some(from), None)?;
        Ok(booking)
    }

    /// Workflow step 6. Only approved bookings may check in; the ledger moves
    /// the same bed count that step 1 reserved.
    pub fn check_in(&self, booking_id: &BookingId) -> Result<Booking, BookingWorkflowError> {
        let mut booking = self.fetch_booking(booking_id)?;
        ensure_status(&booking, "check in", &[BookingStatus::Approved])?;

        let capacity = self
            .ledger
            .check_in(&booking.location_id, booking.number_of_guests)?;

        let from = booking.status;
        booking.status = BookingStatus::CheckedIn;
        booking.checked_in_at = Some(Utc::now());
        booking.workflow_step = booking.workflow_step.max(step::CHECK_IN);
        if let Some(plan) = booking.transportation.as_mut() {
            plan.status = TransportStatus::Completed;
        }
        self.bookings.update(booking.clone())?;

        info!(booking = %booking.id, location = %booking.location_id, "guests checked in");
        self.publish(&booking, Some(from), Some(capacity))?;
        Ok(booking)
    }

    /// Final transition: occupied beds return to the available pool.
    pub fn check_out(&self, booking_id: &BookingId) -> Result<Booking, BookingWorkflowError> {
        let mut booking = self.fetch_booking(booking_id)?;
        ensure_status(&booking, "check out", &[BookingStatus::CheckedIn])?;

        let capacity = self
            .ledger
            .check_out(&booking.location_id, booking.number_of_guests)?;

        let from = booking.status;
        booking.status = BookingStatus::CheckedOut;
        booking.checked_out_at = Some(Utc::now());
        self.bookings.update(booking.clone())?;

        info!(booking = %booking.id, location = %booking.location_id, "guests checked out");
        self.publish(&booking, Some(from), Some(capacity))?;
        Ok(booking)
    }

    /// Abort path before approval: the held beds go back to the available
    /// pool before the terminal status is stored.
    pub fn reject(&self, booking_id: &BookingId) -> Result<Booking, BookingWorkflowError> {
        self.abort(booking_id, "reject", &[BookingStatus::Pending], BookingStatus::Rejected)
    }

    /// Abort path any time before check-in.
    pub fn cancel(&self, booking_id: &BookingId) -> Result<Booking, BookingWorkflowError> {
        self.abort(
            booking_id,
            "cancel",
            &[BookingStatus::Pending, BookingStatus::Approved],
            BookingStatus::Cancelled,
        )
    }

    pub fn booking(&self, booking_id: &BookingId) -> Result<Booking, BookingWorkflowError> {
        self.fetch_booking(booking_id)
    }

    /// Read-only capacity query for one location.
    pub fn availability(
        &self,
        location_id: &LocationId,
    ) -> Result<CapacitySnapshot, BookingWorkflowError> {
        Ok(self.ledger.capacity_of(location_id)?)
    }

    fn abort(
        &self,
        booking_id: &BookingId,
        operation: &'static str,
        allowed: &[BookingStatus],
        terminal: BookingStatus,
    ) -> Result<Booking, BookingWorkflowError> {
        let mut booking = self.fetch_booking(booking_id)?;
        ensure_status(&booking, operation, allowed)?;

        let capacity = self
            .ledger
            .release(&booking.location_id, booking.number_of_guests)?;

        let from = booking.status;
        booking.status = terminal;
        self.bookings.update(booking.clone())?;

        info!(booking = %booking.id, status = %booking.status, "booking closed");
        self.publish(&booking, Some(from), Some(capacity))?;
        Ok(booking)
    }

    fn fetch_booking(&self, id: &BookingId) -> Result<Booking, BookingWorkflowError> {
        Ok(self.bookings.fetch(id)?.ok_or(RepositoryError::NotFound)?)
    }

    fn publish(
        &self,
        booking: &Booking,
        from_status: Option<BookingStatus>,
        capacity: Option<CapacitySnapshot>,
    ) -> Result<(), BookingWorkflowError> {
        self.events.publish(BookingEvent {
            booking_id: booking.id.clone(),
            location_id: booking.location_id.clone(),
            from_status,
            to_status: booking.status,
            occurred_at: Utc::now(),
            capacity,
        })?;
        Ok(())
    }
}

fn ensure_status(
    booking: &Booking,
    operation: &'static str,
    allowed: &[BookingStatus],
) -> Result<(), BookingWorkflowError> {
    if allowed.contains(&booking.status) {
        Ok(())
    } else {
        Err(BookingWorkflowError::InvalidTransition {
            booking: booking.id.clone(),
            operation,
            status: booking.status,
        })
    }
}

fn validate_request(request: &BookingRequest) -> Result<(), BookingWorkflowError> {
    if request.number_of_guests == 0 {
        return Err(BookingWorkflowError::InvalidRequest(
            "number_of_guests must be at least 1",
        ));
    }
    if let Some(check_out) = request.requested_check_out {
        if check_out <= request.requested_check_in {
            return Err(BookingWorkflowError::InvalidRequest(
                "requested check-out must fall after check-in",
            ));
        }
    }
    Ok(())
}
