//! Safehouse placement booking: bed-capacity accounting, safety matching, and
//! the placement state machine.
//!
//! The workflow mutates the [`capacity::CapacityLedger`] only at defined
//! transitions and publishes every status change through
//! [`events::EventPublisher`], so dashboards stay current without the core
//! knowing about any transport.

pub mod capacity;
pub mod domain;
pub mod events;
pub mod matching;
pub mod repository;
pub mod service;
pub mod sessions;
pub mod transport;

#[cfg(test)]
mod tests;

pub use capacity::{CapacityLedger, CapacitySnapshot, InMemoryCapacityLedger, LedgerError};
pub use domain::{
    BedCapacity, Booking, BookingId, BookingRequest, BookingStatus, BookingStatusView, GeoPoint,
    LocationId, NeedsAssessment, RequesterIdentity, ResourceAvailability, SecurityLevel,
    SessionId, ShelterLocation, SupportService, SupportServicesRecord, TransportPlan,
    TransportStatus,
};
pub use events::{BookingEvent, BroadcastEventHub, EventPublisher, PublishError};
pub use matching::{MatchConfig, SafetyMatchEvaluator, SafetyMatchOutcome};
pub use repository::{BookingRepository, InMemoryBookingRepository, RepositoryError};
pub use service::{BookingWorkflowError, BookingWorkflowService};
pub use sessions::{InMemorySessionStore, SessionRecord, SessionRepository};
