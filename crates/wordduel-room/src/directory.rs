//! Room directory: creates, finds and evicts rooms.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use wordduel_game::{Dictionary, GameSession, SolutionSource};
use wordduel_protocol::{ClientProjection, PlayerId, RoomId};
use wordduel_transport::ConnectionId;

use crate::room::{AttachMode, spawn_room};
use crate::{GameStore, Outbound, RoomConfig, RoomError, RoomHandle};

/// Longest accepted room id, in characters.
const MAX_ROOM_ID_LEN: usize = 64;

/// Rejects empty and overlong room ids.
pub fn validate_room_id(room_id: &RoomId) -> Result<(), RoomError> {
    let len = room_id.as_str().chars().count();
    if len == 0 || len > MAX_ROOM_ID_LEN {
        return Err(RoomError::InvalidRoomId(room_id.to_string()));
    }
    Ok(())
}

/// Everything behind the directory lock.
#[derive(Default)]
struct Rooms {
    handles: HashMap<RoomId, RoomHandle>,

    /// Rooms each player has been attached to through this directory, so
    /// a closing connection can be detached without asking every room.
    memberships: HashMap<PlayerId, HashSet<RoomId>>,
}

impl Rooms {
    fn remember(&mut self, player_id: PlayerId, room_id: &RoomId) {
        self.memberships
            .entry(player_id)
            .or_default()
            .insert(room_id.clone());
    }

    fn forget_room(&mut self, room_id: &RoomId) {
        self.handles.remove(room_id);
        self.memberships.retain(|_, rooms| {
            rooms.remove(room_id);
            !rooms.is_empty()
        });
    }
}

/// The entry point for room operations from the connection handlers.
///
/// All map access goes through one `tokio::sync::Mutex`. `create_room`
/// holds it across the existence check and the insert, so two creates of
/// the same id cannot both succeed. Room actors never take this lock.
pub struct RoomDirectory {
    rooms: Mutex<Rooms>,
    config: RoomConfig,
    store: Arc<dyn GameStore>,
    dictionary: Arc<dyn Dictionary>,
    solutions: Arc<dyn SolutionSource>,
}

impl RoomDirectory {
    pub fn new(
        config: RoomConfig,
        store: Arc<dyn GameStore>,
        dictionary: Arc<dyn Dictionary>,
        solutions: Arc<dyn SolutionSource>,
    ) -> Self {
        Self {
            rooms: Mutex::new(Rooms::default()),
            config,
            store,
            dictionary,
            solutions,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates `room_id` with `creator` in the first seat and attaches the
    /// creator's connection.
    ///
    /// # Errors
    /// - [`RoomError::InvalidRoomId`] for an empty or overlong id
    /// - [`RoomError::RoomExists`] if the id is live or persisted
    pub async fn create_room(
        &self,
        room_id: &RoomId,
        creator: PlayerId,
        connection: ConnectionId,
        outbound: Outbound,
    ) -> Result<(RoomHandle, ClientProjection), RoomError> {
        validate_room_id(room_id)?;

        let handle = {
            let mut rooms = self.rooms.lock().await;
            let live = rooms
                .handles
                .get(room_id)
                .is_some_and(|h| !h.is_closed());
            if live || self.store.load_by_room(room_id)?.is_some() {
                return Err(RoomError::RoomExists(room_id.clone()));
            }

            let solution = self.solutions.next_solution();
            let session = GameSession::new(room_id.clone(), solution, creator);
            self.store.save(&session)?;

            let handle = self.spawn(session);
            rooms.handles.insert(room_id.clone(), handle.clone());
            rooms.remember(creator, room_id);
            handle
        };

        tracing::info!(%room_id, %creator, "room created");
        let snapshot = handle
            .attach(creator, connection, outbound, AttachMode::Resume)
            .await?;
        Ok((handle, snapshot))
    }

    /// Seats `player_id` in the open seat of `room_id`, or re-attaches them
    /// if they are already seated there.
    ///
    /// # Errors
    /// - [`RoomError::RoomNotFound`] if the room is neither live nor stored
    /// - [`RoomError::RoomFull`] if both seats belong to other players
    pub async fn join_room(
        &self,
        room_id: &RoomId,
        player_id: PlayerId,
        connection: ConnectionId,
        outbound: Outbound,
    ) -> Result<(RoomHandle, ClientProjection), RoomError> {
        self.attach(room_id, player_id, connection, outbound, AttachMode::Join)
            .await
    }

    /// Re-attaches a seated player and returns their snapshot.
    ///
    /// # Errors
    /// - [`RoomError::RoomNotFound`] if the room is neither live nor stored
    /// - [`RoomError::NotInRoom`] if the player has no seat in it
    pub async fn load(
        &self,
        room_id: &RoomId,
        player_id: PlayerId,
        connection: ConnectionId,
        outbound: Outbound,
    ) -> Result<ClientProjection, RoomError> {
        self.attach(room_id, player_id, connection, outbound, AttachMode::Resume)
            .await
            .map(|(_, snapshot)| snapshot)
    }

    async fn attach(
        &self,
        room_id: &RoomId,
        player_id: PlayerId,
        connection: ConnectionId,
        outbound: Outbound,
        mode: AttachMode,
    ) -> Result<(RoomHandle, ClientProjection), RoomError> {
        let handle = self
            .lookup(room_id)
            .await
            .ok_or_else(|| RoomError::RoomNotFound(room_id.clone()))?;
        let snapshot = match handle.attach(player_id, connection, outbound, mode).await {
            // Evicted between lookup and attach.
            Err(RoomError::Unavailable(_)) => {
                return Err(RoomError::RoomNotFound(room_id.clone()));
            }
            other => other?,
        };
        self.rooms.lock().await.remember(player_id, room_id);
        Ok((handle, snapshot))
    }

    /// Finds a live room, or rehydrates it from the store.
    ///
    /// Store failures are logged and treated as a miss.
    pub async fn lookup(&self, room_id: &RoomId) -> Option<RoomHandle> {
        if validate_room_id(room_id).is_err() {
            return None;
        }

        let mut rooms = self.rooms.lock().await;
        if let Some(handle) = rooms.handles.get(room_id) {
            if !handle.is_closed() {
                return Some(handle.clone());
            }
            rooms.forget_room(room_id);
        }

        let session = match self.store.load_by_room(room_id) {
            Ok(session) => session?,
            Err(e) => {
                tracing::warn!(%room_id, error = %e, "store lookup failed");
                return None;
            }
        };

        tracing::info!(%room_id, "room rehydrated from store");
        let handle = self.spawn(session);
        rooms.handles.insert(room_id.clone(), handle.clone());
        Some(handle)
    }

    /// Detaches `connection` from one room. The seat is kept.
    pub async fn leave_room(
        &self,
        room_id: &RoomId,
        player_id: PlayerId,
        connection: ConnectionId,
    ) {
        let handle = {
            let mut rooms = self.rooms.lock().await;
            if let Some(joined) = rooms.memberships.get_mut(&player_id) {
                joined.remove(room_id);
            }
            rooms.handles.get(room_id).cloned()
        };
        if let Some(handle) = handle {
            let _ = handle.detach(player_id, connection).await;
        }
    }

    /// Detaches `connection` from every room the player is attached to.
    pub async fn detach(&self, player_id: PlayerId, connection: ConnectionId) {
        let handles: Vec<RoomHandle> = {
            let rooms = self.rooms.lock().await;
            rooms
                .memberships
                .get(&player_id)
                .into_iter()
                .flatten()
                .filter_map(|room_id| rooms.handles.get(room_id).cloned())
                .collect()
        };
        for handle in handles {
            let _ = handle.detach(player_id, connection).await;
        }
    }

    /// Destroys every room nobody has been attached to for the idle TTL:
    /// the actor stops, and the room leaves both the map and the store.
    ///
    /// Returns the evicted ids.
    pub async fn evict_idle(&self) -> Vec<RoomId> {
        let mut rooms = self.rooms.lock().await;
        let mut evicted = Vec::new();

        for (room_id, handle) in &rooms.handles {
            let gone = match handle.evict_if_idle(self.config.idle_ttl).await {
                Ok(stopped) => stopped,
                Err(_) => true,
            };
            if gone {
                evicted.push(room_id.clone());
            }
        }

        for room_id in &evicted {
            rooms.forget_room(room_id);
            if let Err(e) = self.store.remove(room_id) {
                tracing::warn!(%room_id, error = %e, "failed to remove stored session");
            }
        }

        if !evicted.is_empty() {
            tracing::info!(count = evicted.len(), "idle rooms evicted");
        }
        evicted
    }

    /// Stops every room actor. Stored sessions are kept.
    pub async fn shutdown(&self) {
        let handles: Vec<RoomHandle> = {
            let mut rooms = self.rooms.lock().await;
            rooms.memberships.clear();
            rooms.handles.drain().map(|(_, h)| h).collect()
        };
        for handle in &handles {
            let _ = handle.shutdown().await;
        }
        tracing::info!(rooms = handles.len(), "room directory shut down");
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.handles.len()
    }

    fn spawn(&self, session: GameSession) -> RoomHandle {
        spawn_room(
            session,
            Arc::clone(&self.dictionary),
            Arc::clone(&self.store),
            self.config.channel_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_id_rejects_empty() {
        assert!(matches!(
            validate_room_id(&RoomId::from("")),
            Err(RoomError::InvalidRoomId(_))
        ));
    }

    #[test]
    fn test_validate_room_id_length_boundary() {
        assert!(validate_room_id(&RoomId::new("a".repeat(64))).is_ok());
        assert!(validate_room_id(&RoomId::new("a".repeat(65))).is_err());
    }

    #[test]
    fn test_validate_room_id_counts_characters_not_bytes() {
        assert!(validate_room_id(&RoomId::new("é".repeat(64))).is_ok());
    }
}
