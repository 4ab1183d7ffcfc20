//! Room actor: an isolated Tokio task that owns one game session.
//!
//! Each room runs in its own task and talks to the outside world through
//! an mpsc channel. The actor applies one command completely (state change,
//! persistence, broadcasts) before it reads the next, which is what keeps a
//! slot's submissions in order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use wordduel_game::{
    Applied, Dictionary, GameSession, Rejection, SessionPhase,
    intents_from_report,
};
use wordduel_protocol::{
    ClientProjection, Intent, PlayerId, ReportedGameState, RoomId,
    ServerEvent,
};
use wordduel_transport::ConnectionId;

use crate::{GameStore, RoomError, RoomState};

/// Channel sender for delivering events to one connection.
pub type Outbound = mpsc::UnboundedSender<ServerEvent>;

/// How an attach treats a player without a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttachMode {
    /// Take the open seat if there is one (`join_room`).
    Join,
    /// Only re-attach a player who is already seated (`load_game_from_room`).
    Resume,
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Attach {
        player_id: PlayerId,
        connection: ConnectionId,
        sender: Outbound,
        mode: AttachMode,
        reply: oneshot::Sender<Result<ClientProjection, RoomError>>,
    },

    /// The connection is gone. The seat is kept.
    Detach {
        player_id: PlayerId,
        connection: ConnectionId,
    },

    Intent {
        player_id: PlayerId,
        intent: Intent,
    },

    /// A legacy whole-board report, reconciled into intents.
    Report {
        player_id: PlayerId,
        report: ReportedGameState,
    },

    Snapshot {
        player_id: PlayerId,
        reply: oneshot::Sender<Option<ClientProjection>>,
    },

    Info {
        reply: oneshot::Sender<RoomInfo>,
    },

    /// Stop if nobody has been attached for at least `ttl`. Replies whether
    /// the actor stopped.
    EvictIfIdle {
        ttl: Duration,
        reply: oneshot::Sender<bool>,
    },

    Shutdown,
}

/// A snapshot of room metadata (not the game itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub state: RoomState,
    /// Seated players, `p1` first.
    pub players: Vec<PlayerId>,
    /// Players with a live connection attached.
    pub attached: usize,
    /// How long the room has had nobody attached, if that is the case.
    pub idle_for: Option<Duration>,
}

/// Handle to a running room actor.
///
/// Cheap to clone; it is just an `mpsc::Sender` and the room id. The
/// directory holds one per live room and hands out clones.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub(crate) async fn attach(
        &self,
        player_id: PlayerId,
        connection: ConnectionId,
        sender: Outbound,
        mode: AttachMode,
    ) -> Result<ClientProjection, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Attach {
            player_id,
            connection,
            sender,
            mode,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Tells the room that `connection` no longer speaks for the player.
    pub async fn detach(
        &self,
        player_id: PlayerId,
        connection: ConnectionId,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Detach {
            player_id,
            connection,
        })
        .await
    }

    /// Delivers an intent (fire-and-forget). Results reach the players
    /// through their outbound channels.
    pub async fn send_intent(
        &self,
        player_id: PlayerId,
        intent: Intent,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Intent { player_id, intent }).await
    }

    /// Delivers a legacy board report (fire-and-forget).
    pub async fn send_report(
        &self,
        player_id: PlayerId,
        report: ReportedGameState,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Report { player_id, report }).await
    }

    /// The player's current view, or `None` if they have no seat.
    pub async fn snapshot(
        &self,
        player_id: PlayerId,
    ) -> Result<Option<ClientProjection>, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot {
            player_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Info { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    pub(crate) async fn evict_if_idle(
        &self,
        ttl: Duration,
    ) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::EvictIfIdle {
            ttl,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }
}

/// One player's live connection into the room.
struct Attachment {
    connection: ConnectionId,
    sender: Outbound,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    session: GameSession,
    attachments: HashMap<PlayerId, Attachment>,
    /// Set whenever `attachments` becomes empty.
    idle_since: Option<Instant>,
    dictionary: Arc<dyn Dictionary>,
    store: Arc<dyn GameStore>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        let room_id = self.session.room_id().clone();
        tracing::info!(%room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Attach {
                    player_id,
                    connection,
                    sender,
                    mode,
                    reply,
                } => {
                    let result =
                        self.handle_attach(player_id, connection, sender, mode);
                    let _ = reply.send(result);
                }
                RoomCommand::Detach {
                    player_id,
                    connection,
                } => self.handle_detach(player_id, connection),
                RoomCommand::Intent { player_id, intent } => {
                    self.handle_intent(player_id, &intent);
                }
                RoomCommand::Report { player_id, report } => {
                    self.handle_report(player_id, &report);
                }
                RoomCommand::Snapshot { player_id, reply } => {
                    let _ = reply.send(self.session.snapshot(player_id));
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::EvictIfIdle { ttl, reply } => {
                    let idle = self
                        .idle_since
                        .is_some_and(|since| since.elapsed() >= ttl);
                    let _ = reply.send(idle);
                    if idle {
                        tracing::info!(%room_id, "room evicted after idle ttl");
                        break;
                    }
                }
                RoomCommand::Shutdown => {
                    tracing::info!(%room_id, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(%room_id, "room actor stopped");
    }

    fn handle_attach(
        &mut self,
        player_id: PlayerId,
        connection: ConnectionId,
        sender: Outbound,
        mode: AttachMode,
    ) -> Result<ClientProjection, RoomError> {
        let room_id = self.session.room_id().clone();
        let newly_seated = match (self.session.seat_of(player_id), mode) {
            (Some(_), _) => false,
            (None, AttachMode::Resume) => {
                return Err(RoomError::NotInRoom(player_id, room_id));
            }
            (None, AttachMode::Join) => {
                if self.session.seat(player_id).is_none() {
                    return Err(RoomError::RoomFull(room_id));
                }
                self.persist();
                true
            }
        };

        if let Some(previous) = self
            .attachments
            .insert(player_id, Attachment { connection, sender })
        {
            if previous.connection != connection {
                tracing::debug!(
                    %room_id,
                    %player_id,
                    old = %previous.connection,
                    new = %connection,
                    "attachment replaced"
                );
            }
        }
        self.idle_since = None;

        tracing::info!(
            %room_id,
            %player_id,
            conn_id = %connection,
            newly_seated,
            attached = self.attachments.len(),
            "player attached"
        );

        // A new opponent is news for whoever was already waiting.
        if newly_seated {
            self.notify_opponent(player_id);
        }

        self.session
            .snapshot(player_id)
            .ok_or(RoomError::NotInRoom(player_id, room_id))
    }

    fn handle_detach(&mut self, player_id: PlayerId, connection: ConnectionId) {
        let current = self
            .attachments
            .get(&player_id)
            .is_some_and(|a| a.connection == connection);
        if !current {
            return;
        }
        self.attachments.remove(&player_id);
        tracing::info!(
            room_id = %self.session.room_id(),
            %player_id,
            conn_id = %connection,
            attached = self.attachments.len(),
            "player detached"
        );
        if self.attachments.is_empty() {
            self.idle_since = Some(Instant::now());
        }
    }

    fn handle_intent(&mut self, player_id: PlayerId, intent: &Intent) {
        if self.session.seat_of(player_id).is_none() {
            tracing::warn!(
                room_id = %self.session.room_id(),
                %player_id,
                "intent from non-member, ignoring"
            );
            return;
        }

        if let Some(applied) = self.apply_one(player_id, intent) {
            self.publish(player_id, vec![applied]);
        }
    }

    /// Replays a legacy whole-state report as intents. The whole report is
    /// one update: at most one save and one broadcast, however many
    /// keystrokes it stood for.
    fn handle_report(&mut self, player_id: PlayerId, report: &ReportedGameState) {
        let Some(slot) = self
            .session
            .seat_of(player_id)
            .and_then(|seat| self.session.slot(seat))
        else {
            tracing::warn!(
                room_id = %self.session.room_id(),
                %player_id,
                "report from non-member, ignoring"
            );
            return;
        };

        let intents = intents_from_report(slot, report);
        let applied: Vec<Applied> = intents
            .iter()
            .filter_map(|intent| self.apply_one(player_id, intent))
            .collect();
        tracing::debug!(
            room_id = %self.session.room_id(),
            %player_id,
            intents = intents.len(),
            applied = applied.len(),
            "reconciled legacy report"
        );
        if !applied.is_empty() {
            self.publish(player_id, applied);
        }
    }

    fn apply_one(&mut self, player_id: PlayerId, intent: &Intent) -> Option<Applied> {
        match self.session.apply(player_id, intent, self.dictionary.as_ref()) {
            Ok(applied) => Some(applied),
            Err(rejection) => {
                self.log_rejection(player_id, &rejection);
                None
            }
        }
    }

    /// Persists, then tells the opponent once, then sends the submitter a
    /// `guess_result` per scored row.
    fn publish(&mut self, player_id: PlayerId, applied: Vec<Applied>) {
        // Play from an unattached seat still counts as activity.
        if self.idle_since.is_some() {
            self.idle_since = Some(Instant::now());
        }

        self.persist();
        self.notify_opponent(player_id);

        for scored in applied.into_iter().filter_map(|a| match a {
            Applied::Scored(scored) => Some(scored),
            Applied::Typed(_) | Applied::Erased(_) => None,
        }) {
            tracing::info!(
                room_id = %self.session.room_id(),
                %player_id,
                row = scored.row,
                status = %scored.status,
                "guess scored"
            );
            let result = self.session.guess_result(&scored);
            self.send_to(player_id, ServerEvent::GuessResult(result));
        }

        if self.session.phase() == SessionPhase::Finished {
            tracing::info!(room_id = %self.session.room_id(), "game finished");
        }
    }

    fn log_rejection(&self, player_id: PlayerId, rejection: &Rejection) {
        tracing::debug!(
            room_id = %self.session.room_id(),
            %player_id,
            %rejection,
            "intent rejected"
        );
    }

    /// Sends `player_id`'s public state to the other seat, if attached.
    fn notify_opponent(&self, player_id: PlayerId) {
        let (Some(opponent), Some(state)) = (
            self.session.opponent_of(player_id),
            self.session.public_state(player_id),
        ) else {
            return;
        };
        self.send_to(opponent, ServerEvent::OnUpdateGame(state));
    }

    /// Fire-and-forget. A closed receiver just means the connection went
    /// away before its detach arrived.
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        let Some(attachment) = self.attachments.get(&player_id) else {
            return;
        };
        let name = event.name();
        if attachment.sender.send(event).is_err() {
            tracing::debug!(
                room_id = %self.session.room_id(),
                %player_id,
                event = name,
                "outbound channel dropped"
            );
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.session) {
            tracing::warn!(
                room_id = %self.session.room_id(),
                error = %e,
                "failed to persist session"
            );
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.session.room_id().clone(),
            state: room_state(&self.session),
            players: self.session.players().collect(),
            attached: self.attachments.len(),
            idle_for: self.idle_since.map(|since| since.elapsed()),
        }
    }
}

fn room_state(session: &GameSession) -> RoomState {
    if !session.is_full() {
        RoomState::WaitingForOpponent
    } else if session.phase() == SessionPhase::Finished {
        RoomState::Finished
    } else {
        RoomState::InProgress
    }
}

/// Spawns a room actor for `session` and returns a handle to it.
///
/// The room starts idle; the first attach clears that.
pub(crate) fn spawn_room(
    session: GameSession,
    dictionary: Arc<dyn Dictionary>,
    store: Arc<dyn GameStore>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let room_id = session.room_id().clone();

    let actor = RoomActor {
        session,
        attachments: HashMap::new(),
        idle_since: Some(Instant::now()),
        dictionary,
        store,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
