//! Session loop.
//!
//! A [`Session`] is one tokio task that owns the [`ActiveMeetings`] view.
//! Hosts talk to it through a cloneable [`SessionHandle`]:
//!
//! - every decoded presence event is forwarded as it arrives;
//! - once the presence subscription is established the host sends
//!   `Subscribed`, which triggers the one snapshot fetch;
//! - clicks on a meeting become `Join` commands.
//!
//! The snapshot fetch and join requests are polled from the same
//! `select!` loop as the commands, so registry mutations never interleave.
//! Dropping every handle, or sending `Shutdown`, stops the loop; in-flight
//! requests are dropped with it.

use std::fmt;
use std::sync::Arc;

use activemeetings_core::{
    CountPolicy, MembershipStore, PresenceEvent, Presenter, RoomContext,
};
use activemeetings_protocol::SnapshotResponse;
use activemeetings_providers::{BoxFuture, JoinService, ProviderResult, SnapshotSource};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use serde::Serialize;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::join::{JoinFuture, JoinInitiator};
use crate::reconcile::{ActiveMeetings, DEFAULT_BUFFER_LIMIT, ReconcileStats};

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the command channel.
    pub command_buffer: usize,
    /// What to do when a `leave` would drive a count below zero.
    pub count_policy: CountPolicy,
    /// Events held while waiting for the snapshot; later ones are dropped.
    pub max_buffered: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_buffer: 64,
            count_policy: CountPolicy::Clamp,
            max_buffered: DEFAULT_BUFFER_LIMIT,
        }
    }
}

impl SessionConfig {
    /// Builder: set the command channel capacity (at least 1).
    pub fn with_command_buffer(mut self, capacity: usize) -> Self {
        self.command_buffer = capacity.max(1);
        self
    }

    /// Builder: set the count underflow policy.
    pub fn with_count_policy(mut self, policy: CountPolicy) -> Self {
        self.count_policy = policy;
        self
    }

    /// Builder: set how many events may wait for the snapshot (at least 1).
    pub fn with_max_buffered(mut self, limit: usize) -> Self {
        self.max_buffered = limit.max(1);
        self
    }
}

/// Commands accepted by a running session.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// A presence event from the subscription.
    Event(PresenceEvent),
    /// The presence subscription is established; fetch the snapshot.
    Subscribed,
    /// The user picked a meeting. An empty name is ignored.
    Join(String),
    /// Stop the session.
    Shutdown,
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Waiting for the subscription to be established.
    #[default]
    Subscribing,
    /// Snapshot request in flight.
    Loading,
    /// Events apply directly.
    Live,
    /// The loop has exited.
    Stopped,
}

impl SessionPhase {
    /// Returns a stable name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subscribing => "subscribing",
            Self::Loading => "loading",
            Self::Live => "live",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-mostly view of a session, refreshed after every command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    /// Registered meetings.
    pub meetings: usize,
    /// Events waiting for the snapshot.
    pub buffered: usize,
    /// Join requests in flight.
    pub pending_joins: usize,
    pub stats: ReconcileStats,
    /// When the snapshot was applied, if it was.
    pub snapshot_at: Option<DateTime<Utc>>,
    /// Last snapshot or join failure.
    pub last_error: Option<String>,
}

/// Shared session status.
pub type SharedSessionStatus = Arc<RwLock<SessionStatus>>;

/// Handle for sending commands to a running session.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    status: SharedSessionStatus,
}

impl SessionHandle {
    /// Sends a raw command.
    pub async fn send(&self, command: SessionCommand) -> SyncResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| SyncError::SessionClosed)
    }

    /// Forwards a presence event.
    pub async fn event(&self, event: PresenceEvent) -> SyncResult<()> {
        self.send(SessionCommand::Event(event)).await
    }

    /// Signals that the presence subscription is established.
    pub async fn subscribed(&self) -> SyncResult<()> {
        self.send(SessionCommand::Subscribed).await
    }

    /// Requests to join `meeting`.
    pub async fn join(&self, meeting: impl Into<String>) -> SyncResult<()> {
        self.send(SessionCommand::Join(meeting.into())).await
    }

    /// Stops the session.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.send(SessionCommand::Shutdown).await
    }

    /// Returns true once the session loop has exited.
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    /// Returns the current session status.
    pub async fn status(&self) -> SessionStatus {
        self.status.read().await.clone()
    }
}

type SnapshotFuture = BoxFuture<'static, ProviderResult<SnapshotResponse>>;

/// Owns the reconciled view and processes commands one at a time.
pub struct Session<P, S> {
    state: ActiveMeetings<P, S>,
    snapshots: Arc<dyn SnapshotSource>,
    joins: JoinInitiator,
    status: SharedSessionStatus,
    command_tx: mpsc::Sender<SessionCommand>,
    command_rx: mpsc::Receiver<SessionCommand>,
}

impl<P: Presenter, S: MembershipStore> Session<P, S> {
    /// Creates a session for `context`.
    pub fn new(
        config: SessionConfig,
        context: RoomContext,
        presenter: P,
        store: S,
        snapshots: Arc<dyn SnapshotSource>,
        joins: Arc<dyn JoinService>,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        Self {
            state: ActiveMeetings::new(context, config.count_policy, presenter, store)
                .with_buffer_limit(config.max_buffered),
            snapshots,
            joins: JoinInitiator::new(joins),
            status: Arc::new(RwLock::new(SessionStatus::default())),
            command_tx,
            command_rx,
        }
    }

    /// Returns a handle for sending commands to the session.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            command_tx: self.command_tx.clone(),
            status: self.status.clone(),
        }
    }

    /// Returns the shared status.
    pub fn status(&self) -> SharedSessionStatus {
        self.status.clone()
    }

    /// Runs the loop until shutdown and returns the final view.
    pub async fn run(self) -> ActiveMeetings<P, S> {
        let Session {
            mut state,
            snapshots,
            joins,
            status,
            command_tx,
            mut command_rx,
        } = self;
        // Only handles keep the channel open from here on.
        drop(command_tx);

        let mut tracker = StatusTracker::default();
        let mut snapshot: Option<SnapshotFuture> = None;
        let mut pending_joins: FuturesUnordered<JoinFuture> = FuturesUnordered::new();

        info!(user = %state.context().user(), page = %state.context().page_url(), "Session started");

        loop {
            tokio::select! {
                biased;

                result = poll_snapshot(&mut snapshot), if snapshot.is_some() => {
                    snapshot = None;
                    match result {
                        Ok(response) => {
                            state.apply_snapshot(response);
                            tracker.snapshot_at = Some(Utc::now());
                        }
                        Err(err) => {
                            state.snapshot_failed(&err);
                            tracker.last_error = Some(err.to_string());
                        }
                    }
                    tracker.phase = SessionPhase::Live;
                }
                Some((pending, result)) = pending_joins.next(), if !pending_joins.is_empty() => {
                    if let Err(ref err) = result {
                        tracker.last_error = Some(err.to_string());
                    }
                    let outcome = state.finish_join(&pending, result);
                    debug!(meeting = %pending.meeting(), outcome = %outcome, "Join finished");
                }
                command = command_rx.recv() => match command {
                    Some(SessionCommand::Event(event)) => {
                        state.handle_event(event);
                    }
                    Some(SessionCommand::Subscribed) => {
                        if tracker.phase != SessionPhase::Subscribing {
                            debug!(phase = %tracker.phase, "Already subscribed, ignoring");
                            continue;
                        }
                        match state.snapshot_url() {
                            Ok(url) => {
                                let source = Arc::clone(&snapshots);
                                debug!(source = source.name(), url = %url, "Fetching active meetings");
                                snapshot = Some(Box::pin(async move { source.fetch(url).await }));
                                tracker.phase = SessionPhase::Loading;
                            }
                            Err(skip) => {
                                state.snapshot_skipped(skip);
                                tracker.phase = SessionPhase::Live;
                            }
                        }
                    }
                    Some(SessionCommand::Join(meeting)) => {
                        if let Ok(pending) = state.prepare_join(Some(&meeting)) {
                            pending_joins.push(joins.request(pending));
                        }
                    }
                    Some(SessionCommand::Shutdown) | None => {
                        info!("Session stopping");
                        break;
                    }
                },
            }

            let next = tracker.status(&state, pending_joins.len());
            *status.write().await = next;
        }

        tracker.phase = SessionPhase::Stopped;
        let next = tracker.status(&state, 0);
        *status.write().await = next;
        state
    }
}

async fn poll_snapshot(
    snapshot: &mut Option<SnapshotFuture>,
) -> ProviderResult<SnapshotResponse> {
    match snapshot {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}

/// Session-level fields of the status that the view does not track.
#[derive(Debug, Default)]
struct StatusTracker {
    phase: SessionPhase,
    snapshot_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl StatusTracker {
    fn status<P: Presenter, S: MembershipStore>(
        &self,
        state: &ActiveMeetings<P, S>,
        pending_joins: usize,
    ) -> SessionStatus {
        SessionStatus {
            phase: self.phase,
            meetings: state.registry().len(),
            buffered: state.buffered(),
            pending_joins,
            stats: state.stats(),
            snapshot_at: self.snapshot_at,
            last_error: self.last_error.clone(),
        }
    }
}
