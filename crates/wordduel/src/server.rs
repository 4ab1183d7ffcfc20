//! `WordDuelServer` builder and server loop.
//!
//! Ties the layers together: transport → protocol → session → room.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use wordduel_game::{BUILTIN_ANSWERS, Dictionary, RandomSolutions, SolutionSource, WordList};
use wordduel_protocol::JsonCodec;
use wordduel_room::{GameStore, MemoryStore, RoomConfig, RoomDirectory};
use wordduel_session::{SessionConfig, SessionManager};
use wordduel_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{ServerConfig, WordDuelError};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) rooms: RoomDirectory,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a server.
///
/// Anything not set falls back to a default: the built-in answer list as
/// both dictionary and solution pool, and an in-memory store.
pub struct WordDuelServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    session_config: SessionConfig,
    sweep_interval: Duration,
    store: Option<Arc<dyn GameStore>>,
    dictionary: Option<Arc<dyn Dictionary>>,
    solutions: Option<Arc<dyn SolutionSource>>,
}

impl WordDuelServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            session_config: SessionConfig::default(),
            sweep_interval: Duration::from_secs(30),
            store: None,
            dictionary: None,
            solutions: None,
        }
    }

    /// A builder carrying everything in `config`, word lists included.
    pub fn from_config(config: &ServerConfig) -> Result<Self, WordDuelError> {
        let (answers, dictionary) = config.load_word_lists()?;
        let solutions = RandomSolutions::new(&answers)?;
        Ok(Self::new()
            .bind(&config.bind.to_string())
            .room_config(config.room.clone())
            .session_config(config.session.clone())
            .sweep_interval(config.sweep_interval)
            .dictionary(Arc::new(dictionary))
            .solutions(Arc::new(solutions)))
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn store(mut self, store: Arc<dyn GameStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn dictionary(mut self, dictionary: Arc<dyn Dictionary>) -> Self {
        self.dictionary = Some(dictionary);
        self
    }

    pub fn solutions(mut self, solutions: Arc<dyn SolutionSource>) -> Self {
        self.solutions = Some(solutions);
        self
    }

    /// Binds the listener and assembles the shared state.
    pub async fn build(self) -> Result<WordDuelServer, WordDuelError> {
        let (dictionary, solutions) = match (self.dictionary, self.solutions) {
            (Some(dictionary), Some(solutions)) => (dictionary, solutions),
            (dictionary, solutions) => {
                let builtin = WordList::parse(BUILTIN_ANSWERS)?;
                let solutions: Arc<dyn SolutionSource> = match solutions {
                    Some(solutions) => solutions,
                    None => Arc::new(RandomSolutions::new(&builtin)?),
                };
                let dictionary: Arc<dyn Dictionary> = match dictionary {
                    Some(dictionary) => dictionary,
                    None => Arc::new(builtin),
                };
                (dictionary, solutions)
            }
        };
        let store: Arc<dyn GameStore> = match self.store {
            Some(store) => store,
            None => Arc::new(MemoryStore::new()),
        };

        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new(self.session_config)),
            rooms: RoomDirectory::new(self.room_config, store, dictionary, solutions),
            codec: JsonCodec,
        });

        Ok(WordDuelServer {
            transport,
            state,
            sweep_interval: self.sweep_interval,
        })
    }
}

impl Default for WordDuelServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server. Call [`run`](Self::run) to start accepting connections.
pub struct WordDuelServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
    sweep_interval: Duration,
}

impl WordDuelServer {
    pub fn builder() -> WordDuelServerBuilder {
        WordDuelServerBuilder::new()
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs until the process is terminated.
    pub async fn run(self) -> Result<(), WordDuelError> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` completes, then stops the
    /// sweeper and every room actor.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), WordDuelError> {
        let addr = self.local_addr().ok();
        tracing::info!(?addr, "wordduel server running");

        let sweeper = tokio::spawn(sweep(Arc::clone(&self.state), self.sweep_interval));
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) if e.is_per_client() => {
                        tracing::warn!(error = %e, "dropped incoming client");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                () = &mut shutdown => break,
            }
        }

        tracing::info!("shutting down");
        sweeper.abort();
        self.state.rooms.shutdown().await;
        Ok(())
    }
}

/// Periodic housekeeping: evict idle rooms, expire abandoned sessions.
async fn sweep(state: Arc<ServerState>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let evicted = state.rooms.evict_idle().await;
        let expired = {
            let mut sessions = state.sessions.lock().await;
            let expired = sessions.expire_stale();
            sessions.cleanup_expired();
            expired
        };

        if !evicted.is_empty() || !expired.is_empty() {
            tracing::debug!(
                rooms = evicted.len(),
                sessions = expired.len(),
                "sweep finished"
            );
        }
    }
}
