use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::capacity::CapacitySnapshot;
use super::domain::{BookingId, BookingStatus, LocationId};

/// Published on every booking status transition. Transitions that mutate the
/// capacity ledger carry the post-mutation counters in the same event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingEvent {
    pub booking_id: BookingId,
    pub location_id: LocationId,
    pub from_status: Option<BookingStatus>,
    pub to_status: BookingStatus,
    pub occurred_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<CapacitySnapshot>,
}

/// Outbound notification boundary. The core only promises to publish; how
/// events reach dashboards or requester sessions is the transport's business.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: BookingEvent) -> Result<(), PublishError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}

/// In-process fan-out so counselor dashboards and requester sessions can
/// subscribe without a live external transport.
pub struct BroadcastEventHub {
    sender: broadcast::Sender<BookingEvent>,
}

impl BroadcastEventHub {
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastEventHub {
    fn default() -> Self {
        Self::new(64)
    }
}

impl EventPublisher for BroadcastEventHub {
    fn publish(&self, event: BookingEvent) -> Result<(), PublishError> {
        // a send with nobody listening is not a delivery failure
        let _ = self.sender.send(event);
        Ok(())
    }
}
