use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for shelter locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(pub String);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier wrapper for bookings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier issued by the authentication collaborator for anonymous requesters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Workflow step markers (1-6). The step advances monotonically on the happy
/// path so callers can resume a partially completed placement.
pub mod step {
    pub const RESERVATION: u8 = 1;
    pub const TRANSPORTATION: u8 = 2;
    pub const INTAKE: u8 = 3;
    pub const SUPPORT_SERVICES: u8 = 4;
    pub const APPROVAL: u8 = 5;
    pub const CHECK_IN: u8 = 6;
}

/// Support services a location may offer and a requester may ask for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SupportService {
    Food,
    Medical,
    Legal,
    Counseling,
    Transportation,
}

impl SupportService {
    pub const fn label(self) -> &'static str {
        match self {
            SupportService::Food => "food",
            SupportService::Medical => "medical",
            SupportService::Legal => "legal",
            SupportService::Counseling => "counseling",
            SupportService::Transportation => "transportation",
        }
    }
}

impl FromStr for SupportService {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "food" => Ok(SupportService::Food),
            "medical" => Ok(SupportService::Medical),
            "legal" => Ok(SupportService::Legal),
            "counseling" => Ok(SupportService::Counseling),
            "transportation" => Ok(SupportService::Transportation),
            other => Err(format!("unknown support service '{other}'")),
        }
    }
}

/// Per-service availability flags on a shelter location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAvailability {
    pub food: bool,
    pub medical: bool,
    pub legal: bool,
    pub counseling: bool,
    pub transportation: bool,
}

impl ResourceAvailability {
    pub const fn offers(&self, service: SupportService) -> bool {
        match service {
            SupportService::Food => self.food,
            SupportService::Medical => self.medical,
            SupportService::Legal => self.legal,
            SupportService::Counseling => self.counseling,
            SupportService::Transportation => self.transportation,
        }
    }

    pub const fn full() -> Self {
        Self {
            food: true,
            medical: true,
            legal: true,
            counseling: true,
            transportation: true,
        }
    }
}

/// Physical security posture of a location, ordered from least to most strict.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    Standard,
    High,
    Maximum,
}

impl SecurityLevel {
    pub const fn label(self) -> &'static str {
        match self {
            SecurityLevel::Standard => "standard",
            SecurityLevel::High => "high",
            SecurityLevel::Maximum => "maximum",
        }
    }
}

/// Four-counter bed accounting for one location.
///
/// `available + reserved + occupied == total` holds at all times; the unsigned
/// representation keeps every pool non-negative by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedCapacity {
    pub total: u32,
    pub available: u32,
    pub reserved: u32,
    pub occupied: u32,
}

impl BedCapacity {
    /// Capacity for a freshly opened house with every bed available.
    pub const fn vacant(total: u32) -> Self {
        Self {
            total,
            available: total,
            reserved: 0,
            occupied: 0,
        }
    }

    pub const fn is_balanced(&self) -> bool {
        self.available + self.reserved + self.occupied == self.total
    }
}

/// WGS84 coordinates used by the transportation planner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A safehouse with bounded bed capacity.
///
/// Locations are created by an administrative collaborator and soft-deactivated
/// via `accepting_placements`; they are never deleted while bookings reference
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelterLocation {
    pub id: LocationId,
    pub name: String,
    pub capacity: BedCapacity,
    pub resources: ResourceAvailability,
    pub security_level: SecurityLevel,
    pub accessibility_features: Vec<String>,
    pub coordinates: GeoPoint,
    pub auto_approve: bool,
    pub accepting_placements: bool,
}

impl ShelterLocation {
    pub fn supports_accessibility(&self, need: &str) -> bool {
        self.accessibility_features
            .iter()
            .any(|feature| feature.eq_ignore_ascii_case(need))
    }
}

/// Exactly one owner per booking: an authenticated user or an anonymous session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequesterIdentity {
    Registered { user_id: String },
    Anonymous { session_id: SessionId },
}

/// Lifecycle states of a booking. `Rejected`, `Cancelled`, and `CheckedOut`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::CheckedOut => "checked_out",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::CheckedOut | BookingStatus::Cancelled
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inbound payload for workflow step 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub location_id: LocationId,
    pub requester: RequesterIdentity,
    pub requested_check_in: NaiveDate,
    pub requested_check_out: Option<NaiveDate>,
    pub number_of_guests: u32,
    pub special_needs: Vec<SupportService>,
    pub accessibility_needs: Vec<String>,
    pub transportation_required: bool,
    pub pickup_location: Option<GeoPoint>,
}

/// Staff-submitted needs assessment attached at intake (workflow step 3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedsAssessment {
    pub assessed_by: String,
    pub assessed_at: DateTime<Utc>,
    pub summary: String,
    pub responses: BTreeMap<String, String>,
    pub follow_up_required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportStatus {
    Scheduled,
    Completed,
}

impl TransportStatus {
    pub const fn label(self) -> &'static str {
        match self {
            TransportStatus::Scheduled => "scheduled",
            TransportStatus::Completed => "completed",
        }
    }
}

/// Pickup arrangement persisted by workflow step 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportPlan {
    pub pickup: GeoPoint,
    pub distance_km: f64,
    pub eta_minutes: u32,
    pub status: TransportStatus,
    pub scheduled_at: DateTime<Utc>,
}

/// Activation record produced by workflow step 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportServicesRecord {
    pub food: bool,
    pub medical: bool,
    pub legal: bool,
    pub counseling: bool,
    pub transportation: bool,
    pub activated_at: DateTime<Utc>,
}

impl SupportServicesRecord {
    pub fn activate(requested: &[SupportService], activated_at: DateTime<Utc>) -> Self {
        let mut record = Self {
            food: false,
            medical: false,
            legal: false,
            counseling: false,
            transportation: false,
            activated_at,
        };
        for service in requested {
            match service {
                SupportService::Food => record.food = true,
                SupportService::Medical => record.medical = true,
                SupportService::Legal => record.legal = true,
                SupportService::Counseling => record.counseling = true,
                SupportService::Transportation => record.transportation = true,
            }
        }
        record
    }
}

/// A request to reserve and ultimately occupy beds at one shelter location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub location_id: LocationId,
    pub requester: RequesterIdentity,
    pub requested_check_in: NaiveDate,
    pub requested_check_out: Option<NaiveDate>,
    pub number_of_guests: u32,
    pub special_needs: Vec<SupportService>,
    pub accessibility_needs: Vec<String>,
    pub transportation_required: bool,
    pub pickup_location: Option<GeoPoint>,
    pub transportation: Option<TransportPlan>,
    pub workflow_step: u8,
    pub needs_assessment: Option<NeedsAssessment>,
    pub support_services: Option<SupportServicesRecord>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Remaining operations a caller may invoke, in workflow order.
    pub fn next_steps(&self) -> Vec<&'static str> {
        match self.status {
            BookingStatus::Rejected | BookingStatus::Cancelled | BookingStatus::CheckedOut => {
                Vec::new()
            }
            BookingStatus::CheckedIn => vec!["check_out"],
            BookingStatus::Pending | BookingStatus::Approved => {
                let mut steps = Vec::new();
                if self.transportation_required && self.transportation.is_none() {
                    steps.push("arrange_transportation");
                }
                if self.needs_assessment.is_none() {
                    steps.push("record_intake");
                }
                if self.support_services.is_none() {
                    steps.push("activate_support_services");
                }
                if self.status == BookingStatus::Pending {
                    steps.push("approve");
                }
                steps.push("check_in");
                steps
            }
        }
    }

    pub fn status_view(&self) -> BookingStatusView {
        BookingStatusView {
            booking_id: self.id.clone(),
            status: self.status.label(),
            workflow_step: self.workflow_step,
            next_steps: self.next_steps(),
        }
    }
}

/// Sanitized progress snapshot handed back to callers after each step.
#[derive(Debug, Clone, Serialize)]
pub struct BookingStatusView {
    pub booking_id: BookingId,
    pub status: &'static str,
    pub workflow_step: u8,
    pub next_steps: Vec<&'static str>,
}
