//! Snapshot and event reconciliation.
//!
//! [`ActiveMeetings`] owns the meeting registry, the injected presenter and
//! the membership store. It merges two inputs into one consistent view:
//!
//! - the snapshot, fetched once after the presence subscription is up, and
//! - the event stream (create / destroy / join / leave).
//!
//! Events that arrive before the snapshot has been applied are buffered and
//! replayed afterwards in arrival order, so a `join` can never be lost to a
//! snapshot that overwrites it.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use activemeetings_core::{
    CountPolicy, MeetingRegistry, MembershipStore, PresenceDelta, PresenceEvent, PresenceKind,
    Presenter, RegistryChange, RegistryError, RoomContext,
};
use activemeetings_protocol::{JoinDecision, SnapshotResponse};
use activemeetings_providers::{ProviderError, ProviderResult, SnapshotSource};
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SnapshotSkip, SyncResult};
use crate::join::{JoinInitiator, JoinOutcome, PendingJoin};

/// Why an event was discarded before touching the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The meeting belongs to another room.
    OtherRoom,
    /// The meeting is not in the previously-joined set.
    NotPreviouslyJoined,
}

impl IgnoreReason {
    /// Returns a stable name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OtherRoom => "other_room",
            Self::NotPreviouslyJoined => "not_previously_joined",
        }
    }
}

/// Why an event was rejected as a protocol violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// `join` or `leave` for a meeting that is not registered.
    UnknownMeeting,
    /// `leave` that would drive a count below zero under `CountPolicy::Reject`.
    CountUnderflow,
    /// Arrived before the snapshot with the buffer already full.
    BufferFull,
}

impl DropReason {
    /// Returns a stable name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownMeeting => "unknown_meeting",
            Self::CountUnderflow => "count_underflow",
            Self::BufferFull => "buffer_full",
        }
    }
}

impl From<&RegistryError> for DropReason {
    fn from(err: &RegistryError) -> Self {
        match err {
            RegistryError::UnknownMeeting { .. } => Self::UnknownMeeting,
            RegistryError::CountUnderflow { .. } => Self::CountUnderflow,
        }
    }
}

/// What happened to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The registry (and possibly the presenter) changed.
    Applied,
    /// Discarded by the room or membership gate.
    Ignored(IgnoreReason),
    /// Rejected as a protocol violation.
    Dropped(DropReason),
    /// Held until the snapshot has been applied.
    Buffered,
}

impl fmt::Display for EventOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::Ignored(reason) => write!(f, "ignored ({})", reason.as_str()),
            Self::Dropped(reason) => write!(f, "dropped ({})", reason.as_str()),
            Self::Buffered => f.write_str("buffered"),
        }
    }
}

/// Counters over every event that reached the gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub applied: u64,
    pub ignored: u64,
    pub dropped: u64,
}

impl ReconcileStats {
    fn record(&mut self, outcome: EventOutcome) {
        match outcome {
            EventOutcome::Applied => self.applied += 1,
            EventOutcome::Ignored(_) => self.ignored += 1,
            EventOutcome::Dropped(_) => self.dropped += 1,
            EventOutcome::Buffered => {}
        }
    }
}

/// Summary of one snapshot application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotReport {
    /// Meetings of this room written to the registry.
    pub seeded: usize,
    /// Seeded meetings that got a row.
    pub rendered: usize,
    /// Meetings of other rooms that were skipped.
    pub foreign: usize,
    /// Buffered events replayed afterwards.
    pub replayed: usize,
}

/// Default number of events held while waiting for the snapshot.
pub const DEFAULT_BUFFER_LIMIT: usize = 1024;

enum Phase {
    AwaitingSnapshot(VecDeque<PresenceEvent>),
    Live,
}

/// Reconciled view of the active meetings of one room.
pub struct ActiveMeetings<P, S> {
    context: RoomContext,
    registry: MeetingRegistry,
    presenter: P,
    store: S,
    rendered: BTreeSet<String>,
    phase: Phase,
    buffer_limit: usize,
    stats: ReconcileStats,
}

impl<P: Presenter, S: MembershipStore> ActiveMeetings<P, S> {
    /// Creates an empty view that buffers events until the snapshot is in.
    pub fn new(context: RoomContext, policy: CountPolicy, presenter: P, store: S) -> Self {
        Self {
            context,
            registry: MeetingRegistry::new(policy),
            presenter,
            store,
            rendered: BTreeSet::new(),
            phase: Phase::AwaitingSnapshot(VecDeque::new()),
            buffer_limit: DEFAULT_BUFFER_LIMIT,
            stats: ReconcileStats::default(),
        }
    }

    /// Builder: cap the events held while waiting for the snapshot (at
    /// least 1). Events past the cap are dropped.
    pub fn with_buffer_limit(mut self, limit: usize) -> Self {
        self.buffer_limit = limit.max(1);
        self
    }

    /// Returns the room context.
    pub fn context(&self) -> &RoomContext {
        &self.context
    }

    /// Returns the registry.
    pub fn registry(&self) -> &MeetingRegistry {
        &self.registry
    }

    /// Returns the presenter.
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Returns the presenter mutably.
    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Returns the membership store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the membership store mutably.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Returns the event counters.
    pub fn stats(&self) -> ReconcileStats {
        self.stats
    }

    /// Returns true once the snapshot step is over and events apply directly.
    pub fn is_live(&self) -> bool {
        matches!(self.phase, Phase::Live)
    }

    /// Returns the number of events waiting for the snapshot.
    pub fn buffered(&self) -> usize {
        match &self.phase {
            Phase::AwaitingSnapshot(buffer) => buffer.len(),
            Phase::Live => 0,
        }
    }

    /// Returns true if `name` currently has a row.
    pub fn is_rendered(&self, name: &str) -> bool {
        self.rendered.contains(name)
    }

    /// Consumes the view and returns the presenter and the store.
    pub fn into_parts(self) -> (P, S) {
        (self.presenter, self.store)
    }

    /// Handles one event: buffers it before the snapshot, applies it after.
    pub fn handle_event(&mut self, event: PresenceEvent) -> EventOutcome {
        if let Phase::AwaitingSnapshot(buffer) = &mut self.phase {
            if buffer.len() >= self.buffer_limit {
                warn!(
                    meeting = %event.meeting,
                    kind = %event.kind,
                    limit = self.buffer_limit,
                    "Snapshot not applied yet and buffer full, dropping event"
                );
                let outcome = EventOutcome::Dropped(DropReason::BufferFull);
                self.stats.record(outcome);
                return outcome;
            }
            debug!(
                meeting = %event.meeting,
                kind = %event.kind,
                buffered = buffer.len() + 1,
                "Buffering event until the snapshot is applied"
            );
            buffer.push_back(event);
            return EventOutcome::Buffered;
        }
        self.apply_event(&event)
    }

    /// Applies one event regardless of the phase.
    pub fn apply_event(&mut self, event: &PresenceEvent) -> EventOutcome {
        let outcome = self.apply_gated(event);
        self.stats.record(outcome);
        outcome
    }

    fn apply_gated(&mut self, event: &PresenceEvent) -> EventOutcome {
        if !self.context.owns(&event.room) {
            debug!(meeting = %event.meeting, room = %event.room, kind = %event.kind, "Ignoring event for another room");
            return EventOutcome::Ignored(IgnoreReason::OtherRoom);
        }

        // Read fresh: another client may have joined a meeting meanwhile.
        let joined = self.store.previously_joined(self.context.user());
        if !joined.contains(&event.meeting) {
            debug!(meeting = %event.meeting, kind = %event.kind, "Ignoring event for a meeting never joined");
            return EventOutcome::Ignored(IgnoreReason::NotPreviouslyJoined);
        }

        match event.kind {
            PresenceKind::Create => self.on_create(&event.meeting),
            PresenceKind::Destroy => self.on_destroy(&event.meeting),
            PresenceKind::Join => self.on_adjust(event, PresenceDelta::join(event.role)),
            PresenceKind::Leave => self.on_adjust(event, PresenceDelta::leave(event.role)),
        }
    }

    fn on_create(&mut self, name: &str) -> EventOutcome {
        match self.registry.upsert(name, PresenceDelta::zeroed()) {
            Ok(change) => {
                self.show_row(&change);
                let active = self.active_names();
                self.presenter.prune_previous(&active);
                info!(meeting = %name, "Meeting started");
                EventOutcome::Applied
            }
            Err(err) => self.drop_event(name, PresenceKind::Create, &err),
        }
    }

    fn on_destroy(&mut self, name: &str) -> EventOutcome {
        match self.registry.remove(name) {
            Some(change) => debug!(
                meeting = %name,
                participants = change.presence().participant_count,
                moderators = change.presence().moderator_count,
                "Removed meeting with its last counts"
            ),
            None => debug!(meeting = %name, "Destroy for a meeting that is not registered"),
        }
        if self.rendered.remove(name) {
            self.presenter.remove_row(name);
        }
        self.presenter.restore_previous(name);
        info!(meeting = %name, "Meeting ended");
        EventOutcome::Applied
    }

    fn on_adjust(&mut self, event: &PresenceEvent, delta: PresenceDelta) -> EventOutcome {
        match self.registry.upsert(&event.meeting, delta) {
            Ok(change) => {
                if self.rendered.contains(&event.meeting) {
                    self.presenter.update_row_text(change.presence());
                }
                debug!(
                    meeting = %event.meeting,
                    kind = %event.kind,
                    role = ?event.role,
                    participants = change.presence().participant_count,
                    moderators = change.presence().moderator_count,
                    "Applied presence change"
                );
                EventOutcome::Applied
            }
            Err(err) => self.drop_event(&event.meeting, event.kind, &err),
        }
    }

    fn drop_event(&self, name: &str, kind: PresenceKind, err: &RegistryError) -> EventOutcome {
        warn!(meeting = %name, kind = %kind, error = %err, "Dropping presence event");
        EventOutcome::Dropped(DropReason::from(err))
    }

    /// Renders a row for the changed entry, or refreshes it if already shown.
    fn show_row(&mut self, change: &RegistryChange) {
        let presence = change.presence();
        if self.rendered.insert(presence.name.clone()) {
            self.presenter.render_row(presence);
        } else {
            self.presenter.update_row_text(presence);
        }
    }

    fn active_names(&self) -> Vec<String> {
        self.registry.names().map(str::to_string).collect()
    }

    /// Returns where to fetch the snapshot from, or why not to fetch it.
    pub fn snapshot_url(&self) -> Result<Url, SnapshotSkip> {
        if !self.context.is_room_page() {
            debug!(page = %self.context.page_url(), "Not on a page to load meetings");
            return Err(SnapshotSkip::NotRoomPage);
        }
        Ok(self.context.snapshot_url())
    }

    /// Seeds the registry from `snapshot`, reveals the list, then replays
    /// buffered events.
    pub fn apply_snapshot(&mut self, snapshot: SnapshotResponse) -> SnapshotReport {
        let joined = self.store.previously_joined(self.context.user());
        let mut report = SnapshotReport::default();

        for descriptor in &snapshot.meetings {
            if descriptor.room_id() != Some(self.context.user()) {
                debug!(meeting = %descriptor.meeting_name, room = ?descriptor.room_id(), "Skipping meeting of another room");
                report.foreign += 1;
                continue;
            }

            let presence = descriptor.presence();
            let change = match self
                .registry
                .upsert(&presence.name, PresenceDelta::reset_to(&presence))
            {
                Ok(change) => change,
                Err(err) => {
                    warn!(meeting = %presence.name, error = %err, "Could not seed meeting");
                    continue;
                }
            };
            report.seeded += 1;

            if joined.contains(&presence.name) {
                self.show_row(&change);
                report.rendered += 1;
            }
        }

        let active = self.active_names();
        self.presenter.prune_previous(&active);
        self.presenter.show_list();
        self.presenter.hide_spinner();

        report.replayed = self.go_live();
        info!(
            seeded = report.seeded,
            rendered = report.rendered,
            foreign = report.foreign,
            replayed = report.replayed,
            "Snapshot applied"
        );
        report
    }

    /// Ends the snapshot step without a snapshot and replays buffered events.
    pub fn snapshot_skipped(&mut self, reason: SnapshotSkip) -> usize {
        debug!(reason = %reason, "Snapshot skipped");
        self.go_live()
    }

    /// Ends the snapshot step after a failed fetch. The list stays hidden.
    pub fn snapshot_failed(&mut self, error: &ProviderError) -> usize {
        warn!(error = %error, "Failed to fetch active meetings");
        self.go_live()
    }

    /// Fetches the snapshot from `source` and applies it.
    ///
    /// Skips and failures still end the snapshot step, so buffered events
    /// are replayed in every case; the error is returned for reporting.
    pub async fn reconcile(&mut self, source: &dyn SnapshotSource) -> SyncResult<SnapshotReport> {
        let url = match self.snapshot_url() {
            Ok(url) => url,
            Err(skip) => {
                self.snapshot_skipped(skip);
                return Err(skip.into());
            }
        };

        debug!(source = source.name(), url = %url, "Fetching active meetings");
        match source.fetch(url).await {
            Ok(snapshot) => Ok(self.apply_snapshot(snapshot)),
            Err(err) => {
                self.snapshot_failed(&err);
                Err(err.into())
            }
        }
    }

    fn go_live(&mut self) -> usize {
        let buffered = match std::mem::replace(&mut self.phase, Phase::Live) {
            Phase::AwaitingSnapshot(buffer) => buffer,
            Phase::Live => return 0,
        };

        let replayed = buffered.len();
        for event in buffered {
            let outcome = self.apply_event(&event);
            debug!(meeting = %event.meeting, kind = %event.kind, outcome = %outcome, "Replayed buffered event");
        }
        replayed
    }

    /// Checks the join preconditions against the store, flagging the name
    /// input on the presenter when no display name is stored.
    pub fn prepare_join(&mut self, meeting: Option<&str>) -> Result<PendingJoin, JoinOutcome> {
        JoinInitiator::prepare(meeting, &self.store, &mut self.presenter)
    }

    /// Hands a join decision to the presenter.
    pub fn finish_join(
        &mut self,
        pending: &PendingJoin,
        result: ProviderResult<JoinDecision>,
    ) -> JoinOutcome {
        JoinInitiator::complete(pending, result, &mut self.presenter)
    }
}
