//! Persistence for game sessions.
//!
//! The directory saves a room's session after every accepted change and
//! consults the store when a room id is not live, so a restarted process
//! (or an evicted actor) can pick a game back up. What sits behind the
//! trait is up to the deployment; [`MemoryStore`] keeps JSON records in a
//! map.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use wordduel_game::GameSession;
use wordduel_protocol::RoomId;

/// Errors from a [`GameStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store backend failed: {0}")]
    Backend(String),

    #[error("record for room {room_id} is corrupt: {source}")]
    Corrupt {
        room_id: RoomId,
        #[source]
        source: serde_json::Error,
    },
}

/// Where sessions are persisted, keyed by room.
///
/// Synchronous on purpose: room actors call it between two commands and
/// must not be suspended halfway through one.
pub trait GameStore: Send + Sync + 'static {
    fn load_by_room(&self, room_id: &RoomId) -> Result<Option<GameSession>, StoreError>;

    /// Inserts or replaces the record for `session.room_id()`.
    fn save(&self, session: &GameSession) -> Result<(), StoreError>;

    /// Removing a missing record is not an error.
    fn remove(&self, room_id: &RoomId) -> Result<(), StoreError>;
}

/// In-process store. Records are kept as JSON so that what comes back out
/// went through the same encoding a real backend would use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<RoomId, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn records(&self) -> Result<MutexGuard<'_, HashMap<RoomId, String>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

impl GameStore for MemoryStore {
    fn load_by_room(&self, room_id: &RoomId) -> Result<Option<GameSession>, StoreError> {
        let records = self.records()?;
        let Some(json) = records.get(room_id) else {
            return Ok(None);
        };
        serde_json::from_str(json)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                room_id: room_id.clone(),
                source,
            })
    }

    fn save(&self, session: &GameSession) -> Result<(), StoreError> {
        let json = serde_json::to_string(session)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        self.records()?.insert(session.room_id().clone(), json);
        Ok(())
    }

    fn remove(&self, room_id: &RoomId) -> Result<(), StoreError> {
        self.records()?.remove(room_id);
        Ok(())
    }
}
