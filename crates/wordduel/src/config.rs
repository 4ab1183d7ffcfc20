//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `WORDDUEL_BIND` | `127.0.0.1:8080` |
//! | `WORDDUEL_ROOM_IDLE_TTL_SECS` | `300` |
//! | `WORDDUEL_RECONNECT_GRACE_SECS` | `120` |
//! | `WORDDUEL_SWEEP_INTERVAL_SECS` | `30` |
//! | `WORDDUEL_ANSWERS` | built-in answer list |
//! | `WORDDUEL_GUESSES` | answers only |
//!
//! The binary loads a `.env` file first (via `dotenvy`) if one exists.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use wordduel_game::{BUILTIN_ANSWERS, WordError, WordList};
use wordduel_room::RoomConfig;
use wordduel_session::SessionConfig;

/// Configuration errors. Unset variables fall back to defaults; set but
/// unparseable ones are errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Everything the server binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub room: RoomConfig,
    pub session: SessionConfig,
    /// How often idle rooms are evicted and stale sessions expired.
    pub sweep_interval: Duration,
    /// Newline-separated solution words.
    pub answers_path: Option<PathBuf>,
    /// Extra accepted guesses on top of the answers.
    pub guesses_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            room: RoomConfig::default(),
            session: SessionConfig::default(),
            sweep_interval: Duration::from_secs(30),
            answers_path: None,
            guesses_path: None,
        }
    }
}

impl ServerConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads variables through `lookup`, which returns `None` for unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind = parse_or(&lookup, "WORDDUEL_BIND", defaults.bind)?;
        let idle_ttl = secs_or(&lookup, "WORDDUEL_ROOM_IDLE_TTL_SECS", defaults.room.idle_ttl)?;
        let reconnect_grace = secs_or(
            &lookup,
            "WORDDUEL_RECONNECT_GRACE_SECS",
            defaults.session.reconnect_grace,
        )?;
        let sweep_interval =
            secs_or(&lookup, "WORDDUEL_SWEEP_INTERVAL_SECS", defaults.sweep_interval)?;
        if sweep_interval.is_zero() {
            return Err(ConfigError::Invalid {
                var: "WORDDUEL_SWEEP_INTERVAL_SECS".into(),
                reason: "must be greater than 0".into(),
            });
        }

        Ok(Self {
            bind,
            room: RoomConfig {
                idle_ttl,
                ..defaults.room
            },
            session: SessionConfig { reconnect_grace },
            sweep_interval,
            answers_path: lookup("WORDDUEL_ANSWERS").map(PathBuf::from),
            guesses_path: lookup("WORDDUEL_GUESSES").map(PathBuf::from),
        })
    }

    /// Loads the answer list and the accepted-guess dictionary.
    ///
    /// Every answer is also an accepted guess.
    pub fn load_word_lists(&self) -> Result<(WordList, WordList), WordError> {
        let answers = match &self.answers_path {
            Some(path) => WordList::load(path)?,
            None => WordList::parse(BUILTIN_ANSWERS)?,
        };
        if answers.is_empty() {
            return Err(WordError::EmptyList);
        }

        let mut dictionary = answers.clone();
        if let Some(path) = &self.guesses_path {
            dictionary.extend(&WordList::load(path)?);
        }

        tracing::info!(
            answers = answers.len(),
            accepted = dictionary.len(),
            "word lists loaded"
        );
        Ok((answers, dictionary))
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: var.to_string(),
            reason: format!("{raw:?}: {e}"),
        }),
    }
}

fn secs_or(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    parse_or(lookup, var, default.as_secs()).map(Duration::from_secs)
}
