//! Per-connection handler: handshake, then event routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `hello` → validate version, issue or resume a player
//!   2. Send `welcome`
//!   3. Loop: client frames → directory / room actors; room events → client

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use wordduel_protocol::{
    ClientEvent, Codec, ErrorPayload, Hello, PROTOCOL_VERSION, PlayerId,
    ProtocolError, RoomId, ServerEvent, UpdateGame, Welcome,
};
use wordduel_room::{Outbound, RoomError};
use wordduel_transport::{Connection, ConnectionId, WebSocketConnection};

use crate::WordDuelError;
use crate::server::ServerState;

/// How long a new connection has to say `hello`.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Detaches the player from their rooms and starts the session grace
/// period when the handler exits, however it exits.
///
/// `Drop` is synchronous, so the async cleanup runs in a spawned task.
struct ConnectionGuard {
    player_id: PlayerId,
    conn_id: ConnectionId,
    state: Arc<ServerState>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.rooms.detach(player_id, conn_id).await;
            let mut sessions = state.sessions.lock().await;
            if let Err(e) = sessions.disconnect(player_id, conn_id) {
                tracing::debug!(%player_id, error = %e, "disconnect skipped");
            }
        });
    }
}

/// What a handler needs to act for one player.
struct Client<'a> {
    conn: &'a WebSocketConnection,
    state: &'a ServerState,
    player_id: PlayerId,
    outbound: Outbound,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), WordDuelError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let player_id = perform_handshake(&conn, &state).await?;
    let _guard = ConnectionGuard {
        player_id,
        conn_id,
        state: Arc::clone(&state),
    };

    let (outbound, mut inbox) = mpsc::unbounded_channel::<ServerEvent>();
    let client = Client {
        conn: &conn,
        state: &state,
        player_id,
        outbound,
    };

    loop {
        tokio::select! {
            incoming = conn.recv() => match incoming {
                Ok(Some(data)) => client.on_frame(&data).await?,
                Ok(None) => {
                    tracing::info!(%player_id, %conn_id, "connection closed");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%player_id, error = %e, "recv error");
                    break;
                }
            },
            Some(event) = inbox.recv() => client.send(&event).await?,
        }
    }

    // _guard drops here → detach + session grace period.
    Ok(())
}

/// Receives `hello`, resolves the player and answers `welcome`.
async fn perform_handshake(
    conn: &WebSocketConnection,
    state: &ServerState,
) -> Result<PlayerId, WordDuelError> {
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(invalid("connection closed before hello"));
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(invalid("hello timed out")),
    };

    let hello = match state.codec.decode::<ClientEvent>(&data) {
        Ok(ClientEvent::Hello(hello)) => hello,
        Ok(other) => {
            tracing::warn!(event = ?other, "first frame was not hello");
            send_error(conn, state, 400, "expected hello").await?;
            return Err(invalid("first frame must be hello"));
        }
        Err(e) => {
            send_error(conn, state, 400, "expected hello").await?;
            return Err(e.into());
        }
    };
    let Hello {
        version,
        reconnect_token,
    } = hello;

    if version != PROTOCOL_VERSION {
        let message =
            format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}");
        send_error(conn, state, 400, &message).await?;
        return Err(invalid("protocol version mismatch"));
    }

    let conn_id = conn.id();
    let (session, resumed) = {
        let mut sessions = state.sessions.lock().await;
        match reconnect_token.as_deref().map(|t| sessions.reconnect(t, conn_id)) {
            Some(Ok(session)) => (session, true),
            Some(Err(e)) => {
                tracing::info!(%conn_id, reason = %e, "reconnect refused, issuing new player");
                (sessions.create(conn_id), false)
            }
            None => (sessions.create(conn_id), false),
        }
    };

    let welcome = ServerEvent::Welcome(Welcome {
        player_id: session.player_id,
        reconnect_token: session.reconnect_token,
        resumed,
    });
    let text = state.codec.encode(&welcome)?;
    conn.send(&text).await?;

    tracing::info!(%conn_id, player_id = %session.player_id, resumed, "player greeted");
    Ok(session.player_id)
}

impl Client<'_> {
    async fn on_frame(&self, data: &[u8]) -> Result<(), WordDuelError> {
        let event: ClientEvent = match self.state.codec.decode(data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(player_id = %self.player_id, error = %e, "malformed frame dropped");
                return Ok(());
            }
        };

        match event {
            ClientEvent::Hello(_) => {
                self.send_error(409, "already greeted").await?;
            }
            ClientEvent::CreateRoom(room_id) => self.create_room(room_id).await?,
            ClientEvent::JoinRoom(room_id) => self.join_room(room_id).await?,
            ClientEvent::LoadGameFromRoom(room_id) => self.load_game(room_id).await?,
            ClientEvent::UpdateGame(update) => self.update_game(update).await?,
            ClientEvent::LeaveRoom(room_id) => {
                self.state
                    .rooms
                    .leave_room(&room_id, self.player_id, self.conn.id())
                    .await;
            }
        }
        Ok(())
    }

    async fn create_room(&self, room_id: RoomId) -> Result<(), WordDuelError> {
        let result = self
            .state
            .rooms
            .create_room(&room_id, self.player_id, self.conn.id(), self.outbound.clone())
            .await;

        let reply = match result {
            Ok(_) => ServerEvent::CreateRoomSuccess(room_id),
            Err(e) => {
                self.log_room_error(&room_id, &e, "create_room failed");
                ServerEvent::CreateRoomFail(room_id)
            }
        };
        self.send(&reply).await
    }

    async fn join_room(&self, room_id: RoomId) -> Result<(), WordDuelError> {
        let result = self
            .state
            .rooms
            .join_room(&room_id, self.player_id, self.conn.id(), self.outbound.clone())
            .await;

        let reply = match result {
            Ok(_) => ServerEvent::GameFound(room_id),
            Err(RoomError::RoomFull(_)) => ServerEvent::RoomFull(room_id),
            Err(e) => {
                self.log_room_error(&room_id, &e, "join_room failed");
                ServerEvent::GameNotFound(room_id)
            }
        };
        self.send(&reply).await
    }

    async fn load_game(&self, room_id: RoomId) -> Result<(), WordDuelError> {
        let result = self
            .state
            .rooms
            .load(&room_id, self.player_id, self.conn.id(), self.outbound.clone())
            .await;

        let reply = match result {
            Ok(snapshot) => ServerEvent::OnLoadGameFromRoom(snapshot),
            Err(e) => {
                self.log_room_error(&room_id, &e, "load_game_from_room failed");
                ServerEvent::GameNotFound(room_id)
            }
        };
        self.send(&reply).await
    }

    /// Forwards an intent (or a legacy board report) to the room actor.
    /// Broadcasts come back through the outbound channel.
    async fn update_game(&self, update: UpdateGame) -> Result<(), WordDuelError> {
        let UpdateGame {
            room_id,
            intent,
            game_state,
        } = update;

        let Some(handle) = self.state.rooms.lookup(&room_id).await else {
            return self.send(&ServerEvent::GameNotFound(room_id)).await;
        };

        let forwarded = match (intent, game_state) {
            (Some(intent), _) => handle.send_intent(self.player_id, intent).await,
            (None, Some(report)) => handle.send_report(self.player_id, report).await,
            (None, None) => {
                tracing::warn!(player_id = %self.player_id, %room_id, "update_game without intent or gameState");
                return Ok(());
            }
        };

        if let Err(e) = forwarded {
            self.log_room_error(&room_id, &e, "update_game not delivered");
            self.send(&ServerEvent::GameNotFound(room_id)).await?;
        }
        Ok(())
    }

    async fn send(&self, event: &ServerEvent) -> Result<(), WordDuelError> {
        let text = self.state.codec.encode(event)?;
        self.conn.send(&text).await?;
        tracing::trace!(player_id = %self.player_id, event = event.name(), "sent");
        Ok(())
    }

    async fn send_error(&self, code: u16, message: &str) -> Result<(), WordDuelError> {
        self.send(&ServerEvent::Error(ErrorPayload {
            code,
            message: message.to_string(),
        }))
        .await
    }

    fn log_room_error(&self, room_id: &RoomId, error: &RoomError, what: &str) {
        match error {
            RoomError::Store(_) | RoomError::Unavailable(_) => {
                tracing::warn!(player_id = %self.player_id, %room_id, %error, "{what}");
            }
            _ => {
                tracing::debug!(player_id = %self.player_id, %room_id, %error, "{what}");
            }
        }
    }
}

async fn send_error(
    conn: &WebSocketConnection,
    state: &ServerState,
    code: u16,
    message: &str,
) -> Result<(), WordDuelError> {
    let event = ServerEvent::Error(ErrorPayload {
        code,
        message: message.to_string(),
    });
    let text = state.codec.encode(&event)?;
    conn.send(&text).await?;
    Ok(())
}

fn invalid(reason: &str) -> WordDuelError {
    ProtocolError::InvalidMessage(reason.to_string()).into()
}
