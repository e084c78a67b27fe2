use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{BookingId, SessionId};
use super::repository::RepositoryError;

/// Anonymous requester record. The authentication collaborator issues the
/// session id; this module only tracks what the booking core needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub bookings: Vec<BookingId>,
}

impl SessionRecord {
    pub fn new(id: SessionId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            bookings: Vec::new(),
        }
    }
}

/// Explicit session storage interface. Process memory is never the source of
/// truth in a multi-instance deployment; any persistent store can sit behind
/// this.
pub trait SessionRepository: Send + Sync {
    fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError>;
    fn put(&self, record: SessionRecord) -> Result<(), RepositoryError>;
    fn delete(&self, id: &SessionId) -> Result<(), RepositoryError>;
}

/// Map-backed store used by the demo binary and tests.
#[derive(Default)]
pub struct InMemorySessionStore {
    records: Mutex<HashMap<SessionId, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRepository for InMemorySessionStore {
    fn get(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("session store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn put(&self, record: SessionRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("session store mutex poisoned");
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn delete(&self, id: &SessionId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("session store mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}
