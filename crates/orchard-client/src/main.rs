//! Orchard client binary.
//!
//! Signs in to the game server and keeps the board in sync until it is
//! interrupted.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load client configuration from the environment
//! 3. Load engine configuration from `orchard-config.yaml`
//! 4. Make sure the cookie session is signed in
//! 5. Run a session until Ctrl-C or an auth loss
//! 6. On auth loss, sign in again once and start a fresh session

use std::sync::Arc;

use anyhow::{Context, bail};
use orchard_client::session::{self, SessionEnd, SessionEvent, SessionOptions};
use orchard_client::{ClientConfig, GameServer, HttpTransport};
use orchard_types::Credentials;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Application entry point for the Orchard client.
///
/// # Errors
///
/// Returns an error if configuration is invalid, sign-in fails, or the
/// session is lost twice.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("orchard-client starting");

    // 2-3. Load configuration.
    let config = ClientConfig::from_env().context("loading client configuration")?;
    let engine = config
        .load_engine_config()
        .context("loading engine configuration")?;
    info!(
        server_url = config.server_url,
        sync_interval_ms = engine.timing.sync_interval_ms,
        display_interval_ms = engine.timing.display_interval_ms,
        plot_count = engine.board.plot_count,
        "Configuration loaded"
    );

    let server = Arc::new(HttpTransport::new(&config)?);
    let mut relogged = false;

    loop {
        // 4. Sign in.
        authenticate(server.as_ref(), config.credentials.as_ref()).await?;

        // 5. Run a session.
        let (handle, mut events) = session::start(
            Arc::clone(&server),
            &engine,
            SessionOptions::from_config(&engine),
        );
        let session_id = handle.id();

        let renderer = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                log_event(&event);
            }
        });
        let control = handle.control();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received");
                control.stop();
            }
        });

        let end = handle.wait().await;
        interrupt.abort();
        if let Err(e) = renderer.await {
            warn!(error = %e, "event logger failed");
        }

        // 6. Decide what comes next.
        match end {
            SessionEnd::Stopped => {
                if let Err(e) = server.logout().await {
                    warn!(error = %e, "logout failed");
                }
                info!(%session_id, "orchard-client stopped");
                return Ok(());
            }
            SessionEnd::AuthenticationLost if !relogged && config.credentials.is_some() => {
                warn!(%session_id, "authentication lost, signing in again");
                relogged = true;
            }
            SessionEnd::AuthenticationLost => {
                bail!("authentication lost and no further sign-in attempt is allowed");
            }
        }
    }
}

/// Make sure the cookie session is signed in.
async fn authenticate<S: GameServer>(
    server: &S,
    credentials: Option<&Credentials>,
) -> anyhow::Result<()> {
    if server.check_session().await.unwrap_or(false) {
        info!("resuming existing session");
        return Ok(());
    }
    let Some(credentials) = credentials else {
        bail!("not signed in and ORCHARD_USERNAME/ORCHARD_PASSWORD are not set");
    };
    server
        .login(credentials)
        .await
        .with_context(|| format!("signing in as {}", credentials.username))?;
    info!(username = credentials.username, "signed in");
    Ok(())
}

/// Stand-in renderer: log every batch.
fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::Synced { generation, ops } => {
            debug!(generation, ops = ops.len(), "sync applied");
        }
        SessionEvent::Ticked { ops } => debug!(ops = ops.len(), "display refreshed"),
        SessionEvent::ActionApplied {
            action,
            generation,
            ops,
        } => info!(action, generation, ops = ops.len(), "action applied"),
        SessionEvent::ActionRejected { action, message } => {
            warn!(action, message, "action rejected");
        }
        SessionEvent::Ended { end, ops } => info!(?end, ops = ops.len(), "view torn down"),
    }
}
