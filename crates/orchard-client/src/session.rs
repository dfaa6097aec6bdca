//! Session scheduler: the sync tick and the display tick.
//!
//! A session owns one [`Board`] behind a `tokio::sync::Mutex` and runs two
//! tasks against it:
//!
//! - The **sync task** fetches a snapshot every sync interval and applies
//!   it. The fetch happens before the lock is taken, so while it is in
//!   flight the display task keeps reading the previous snapshot. A fetch
//!   that an action reply overtook is dropped. Ticks are skipped while the
//!   page is hidden and never caught up.
//! - The **display task** refreshes clock-derived text every display
//!   interval, hidden or not.
//!
//! Each tick holds the lock for its whole unit of work, so a sync never
//! interleaves with a display refresh. Both tasks watch one
//! [`SessionControl`]; ending it stops both. The sync task ends the session
//! itself when the server reports the cookie session gone.
//!
//! View batches and player-facing notices go to the renderer over an
//! unbounded channel of [`SessionEvent`]s.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use orchard_core::{Board, EngineConfig, SyncOutcome, ViewOp};
use orchard_types::GameAction;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::error::ClientError;
use crate::transport::GameServer;

/// Wall-clock source for derived countdowns.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Stopped on request (logout, shutdown).
    Stopped,
    /// The server no longer recognises the session; hand off to auth.
    AuthenticationLost,
}

/// Something the renderer should act on.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A sync snapshot was applied.
    Synced {
        /// Store generation after the install.
        generation: u64,
        /// View operations to apply.
        ops: Vec<ViewOp>,
    },
    /// The display tick changed derived text.
    Ticked {
        /// View operations to apply.
        ops: Vec<ViewOp>,
    },
    /// An action succeeded and its returned state was applied.
    ActionApplied {
        /// Action name.
        action: &'static str,
        /// Store generation after the install.
        generation: u64,
        /// View operations to apply.
        ops: Vec<ViewOp>,
    },
    /// The server refused an action. Show `message` to the player.
    ActionRejected {
        /// Action name.
        action: &'static str,
        /// Server-supplied reason.
        message: String,
    },
    /// The session is over and its view was torn down.
    Ended {
        /// Why it ended.
        end: SessionEnd,
        /// Removals of every remaining node.
        ops: Vec<ViewOp>,
    },
}

/// Timing and clock for a session.
#[derive(Clone)]
pub struct SessionOptions {
    /// Period of the sync tick.
    pub sync_interval: Duration,
    /// Period of the display tick.
    pub display_interval: Duration,
    /// Wall clock used for derived countdowns.
    pub clock: Clock,
}

impl SessionOptions {
    /// Intervals from the engine configuration, real wall clock.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            sync_interval: Duration::from_millis(config.timing.sync_interval_ms),
            display_interval: Duration::from_millis(config.timing.display_interval_ms),
            clock: Arc::new(Utc::now),
        }
    }
}

impl core::fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionOptions")
            .field("sync_interval", &self.sync_interval)
            .field("display_interval", &self.display_interval)
            .finish_non_exhaustive()
    }
}

/// Shared stop switch and visibility flag of one session.
#[derive(Debug, Clone)]
pub struct SessionControl {
    inner: Arc<ControlInner>,
}

#[derive(Debug)]
struct ControlInner {
    end: watch::Sender<Option<SessionEnd>>,
    visible: AtomicBool,
}

impl SessionControl {
    fn new() -> Self {
        let (end, _) = watch::channel(None);
        Self {
            inner: Arc::new(ControlInner {
                end,
                visible: AtomicBool::new(true),
            }),
        }
    }

    /// Stop both ticks.
    pub fn stop(&self) {
        self.end(SessionEnd::Stopped);
    }

    /// End the session. The first reason recorded wins.
    pub fn end(&self, reason: SessionEnd) {
        self.inner.end.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
    }

    /// Why the session ended, if it has.
    pub fn ended(&self) -> Option<SessionEnd> {
        *self.inner.end.borrow()
    }

    /// Report page visibility. Hidden pages skip sync ticks.
    pub fn set_visible(&self, visible: bool) {
        self.inner.visible.store(visible, Ordering::Relaxed);
    }

    /// Current page visibility.
    pub fn is_visible(&self) -> bool {
        self.inner.visible.load(Ordering::Relaxed)
    }

    fn subscribe(&self) -> watch::Receiver<Option<SessionEnd>> {
        self.inner.end.subscribe()
    }
}

/// Resolves once the session has ended.
async fn session_ended(rx: &mut watch::Receiver<Option<SessionEnd>>) {
    loop {
        if rx.borrow_and_update().is_some() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

/// State shared by the tasks and the handle.
struct Shared<S> {
    id: Uuid,
    server: Arc<S>,
    board: Mutex<Board>,
    control: SessionControl,
    events: mpsc::UnboundedSender<SessionEvent>,
    clock: Clock,
}

impl<S> Shared<S> {
    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!(session_id = %self.id, "renderer gone, dropping event");
        }
    }
}

/// A running session.
///
/// Dropping the handle stops both ticks.
pub struct SessionHandle<S> {
    shared: Arc<Shared<S>>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl<S> Drop for SessionHandle<S> {
    fn drop(&mut self) {
        self.shared.control.stop();
    }
}

/// Start a session: spawn both ticks and return the handle plus the event
/// stream for the renderer. Must be called inside a tokio runtime.
pub fn start<S>(
    server: Arc<S>,
    config: &EngineConfig,
    options: SessionOptions,
) -> (SessionHandle<S>, mpsc::UnboundedReceiver<SessionEvent>)
where
    S: GameServer + 'static,
{
    let (events, rx) = mpsc::unbounded_channel();
    let id = Uuid::now_v7();
    let shared = Arc::new(Shared {
        id,
        server,
        board: Mutex::new(Board::new(config)),
        control: SessionControl::new(),
        events,
        clock: options.clock,
    });
    info!(session_id = %id, "session started");

    let span = info_span!("session", session_id = %id);
    let sync = tokio::spawn(
        sync_loop(Arc::clone(&shared), options.sync_interval).instrument(span.clone()),
    );
    let display = tokio::spawn(
        display_loop(Arc::clone(&shared), options.display_interval).instrument(span),
    );

    (
        SessionHandle {
            shared,
            tasks: vec![("sync", sync), ("display", display)],
        },
        rx,
    )
}

impl<S: GameServer + 'static> SessionHandle<S> {
    /// Session id recorded in every log line of this session.
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// A clone of the control switch.
    pub fn control(&self) -> SessionControl {
        self.shared.control.clone()
    }

    /// Stop both ticks.
    pub fn stop(&self) {
        self.shared.control.stop();
    }

    /// Report page visibility.
    pub fn set_visible(&self, visible: bool) {
        self.shared.control.set_visible(visible);
    }

    /// Generation of the installed snapshot.
    pub async fn generation(&self) -> u64 {
        self.shared.board.lock().await.generation()
    }

    /// Run `f` against the board under the tick lock.
    pub async fn with_board<T>(&self, f: impl FnOnce(&Board) -> T) -> T {
        let board = self.shared.board.lock().await;
        f(&board)
    }

    /// Perform a player action and apply the state it returns exactly like
    /// a sync.
    ///
    /// A rejection is also reported as [`SessionEvent::ActionRejected`]; an
    /// auth loss ends the session.
    pub async fn perform(&self, action: GameAction) -> Result<SyncOutcome, ClientError> {
        let shared = &self.shared;
        let reply = shared.server.perform(&action).await;
        match reply {
            Ok(Some(snapshot)) => {
                let mut board = shared.board.lock().await;
                let outcome = board.apply(snapshot, (shared.clock)());
                shared.emit(SessionEvent::ActionApplied {
                    action: action.name(),
                    generation: outcome.generation,
                    ops: outcome.ops.clone(),
                });
                Ok(outcome)
            }
            Ok(None) => Ok(SyncOutcome {
                generation: shared.board.lock().await.generation(),
                ..SyncOutcome::default()
            }),
            Err(ClientError::Rejected { message }) => {
                info!(action = action.name(), %message, "action rejected");
                shared.emit(SessionEvent::ActionRejected {
                    action: action.name(),
                    message: message.clone(),
                });
                Err(ClientError::Rejected { message })
            }
            Err(ClientError::Unauthenticated) => {
                warn!(action = action.name(), "authentication lost during action");
                shared.control.end(SessionEnd::AuthenticationLost);
                Err(ClientError::Unauthenticated)
            }
            Err(e) => {
                warn!(action = action.name(), error = %e, "action failed");
                Err(e)
            }
        }
    }

    /// Wait until the session ends, join both ticks, and tear the view
    /// down.
    pub async fn wait(mut self) -> SessionEnd {
        let mut ended = self.shared.control.subscribe();
        session_ended(&mut ended).await;

        for (name, task) in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!(session_id = %self.shared.id, task = name, error = %e, "tick task failed");
            }
        }

        let end = self.shared.control.ended().unwrap_or(SessionEnd::Stopped);
        let ops = self.shared.board.lock().await.teardown();
        self.shared.emit(SessionEvent::Ended { end, ops });
        info!(session_id = %self.shared.id, ?end, "session ended");
        end
    }
}

async fn sync_loop<S: GameServer>(shared: Arc<Shared<S>>, period: Duration) {
    let mut ended = shared.control.subscribe();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = session_ended(&mut ended) => break,
            _ = ticker.tick() => {}
        }

        if !shared.control.is_visible() {
            debug!("page hidden, skipping sync");
            continue;
        }

        let before = shared.board.lock().await.generation();
        // The only suspension point of a sync; nothing is locked here.
        let fetched = tokio::select! {
            biased;
            () = session_ended(&mut ended) => break,
            fetched = shared.server.fetch_snapshot() => fetched,
        };

        match fetched {
            Ok(snapshot) => {
                let mut board = shared.board.lock().await;
                if board.generation() != before {
                    debug!(
                        fetched_at = before,
                        installed = board.generation(),
                        "action state landed during fetch, dropping sync"
                    );
                    continue;
                }
                let outcome = board.apply(snapshot, (shared.clock)());
                drop(board);
                shared.emit(SessionEvent::Synced {
                    generation: outcome.generation,
                    ops: outcome.ops,
                });
            }
            Err(ClientError::Unauthenticated) => {
                warn!("authentication lost, stopping session");
                shared.control.end(SessionEnd::AuthenticationLost);
                break;
            }
            Err(e) => {
                warn!(error = %e, "sync failed, retrying next tick");
            }
        }
    }
    debug!("sync task stopped");
}

async fn display_loop<S>(shared: Arc<Shared<S>>, period: Duration) {
    let mut ended = shared.control.subscribe();
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = session_ended(&mut ended) => break,
            _ = ticker.tick() => {}
        }

        let ops = shared.board.lock().await.tick((shared.clock)());
        if !ops.is_empty() {
            shared.emit(SessionEvent::Ticked { ops });
        }
    }
    debug!("display task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_end_reason_wins() {
        let control = SessionControl::new();
        assert_eq!(control.ended(), None);
        control.end(SessionEnd::AuthenticationLost);
        control.stop();
        assert_eq!(control.ended(), Some(SessionEnd::AuthenticationLost));

        let mut rx = control.subscribe();
        session_ended(&mut rx).await;
    }

    #[test]
    fn visibility_defaults_to_visible() {
        let control = SessionControl::new();
        assert!(control.is_visible());
        control.clone().set_visible(false);
        assert!(!control.is_visible());
    }

    #[test]
    fn options_follow_engine_timing() {
        let options = SessionOptions::from_config(&EngineConfig::default());
        assert_eq!(options.sync_interval, Duration::from_secs(5));
        assert_eq!(options.display_interval, Duration::from_secs(1));
    }
}
