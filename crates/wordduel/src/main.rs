//! `wordduel-server`: runs a WordDuel server configured from the
//! environment (see [`wordduel::config`]).

use wordduel::{ServerConfig, WordDuelError, WordDuelServerBuilder, logging};

#[tokio::main]
async fn main() -> Result<(), WordDuelError> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    logging::init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        bind = %config.bind,
        idle_ttl_secs = config.room.idle_ttl.as_secs(),
        reconnect_grace_secs = config.session.reconnect_grace.as_secs(),
        "starting wordduel server"
    );

    let server = WordDuelServerBuilder::from_config(&config)?.build().await?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
}
