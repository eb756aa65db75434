//! Presence types for running meetings.
//!
//! - [`MeetingPresence`]: who is currently in a meeting, split by role
//! - [`PresenceEvent`]: one change reported by the live presence channel
//! - [`Role`]: moderator or regular participant

use serde::{Deserialize, Serialize};

/// Wire value the channel uses for moderators.
const MODERATOR_WIRE_ROLE: &str = "MODERATOR";

/// Role of an attendee as reported by presence events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Counted in `moderator_count`.
    Moderator,
    /// Counted in `participant_count`.
    #[default]
    Participant,
}

impl Role {
    /// Maps a wire role. Anything other than `MODERATOR`, including a
    /// missing role, is a regular participant.
    pub fn from_wire(role: Option<&str>) -> Self {
        match role {
            Some(MODERATOR_WIRE_ROLE) => Self::Moderator,
            _ => Self::Participant,
        }
    }

    /// Returns the wire representation used by the presence channel.
    pub fn as_wire(&self) -> Option<&'static str> {
        match self {
            Self::Moderator => Some(MODERATOR_WIRE_ROLE),
            Self::Participant => None,
        }
    }
}

/// Presence record for one running meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingPresence {
    /// Meeting name, unique among running meetings.
    pub name: String,
    /// Attendees that are not moderators.
    pub participant_count: u32,
    /// Moderator attendees.
    pub moderator_count: u32,
}

impl MeetingPresence {
    /// Creates a presence record with explicit counts.
    pub fn new(name: impl Into<String>, participant_count: u32, moderator_count: u32) -> Self {
        Self {
            name: name.into(),
            participant_count,
            moderator_count,
        }
    }

    /// Creates a presence record for a meeting nobody has joined yet.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, 0, 0)
    }

    /// Builds a presence record from snapshot totals, where `total`
    /// includes the moderators.
    pub fn from_totals(name: impl Into<String>, total: u32, moderators: u32) -> Self {
        Self::new(name, total.saturating_sub(moderators), moderators)
    }

    /// Returns the count for the given role.
    pub fn count(&self, role: Role) -> u32 {
        match role {
            Role::Moderator => self.moderator_count,
            Role::Participant => self.participant_count,
        }
    }

    pub(crate) fn count_mut(&mut self, role: Role) -> &mut u32 {
        match role {
            Role::Moderator => &mut self.moderator_count,
            Role::Participant => &mut self.participant_count,
        }
    }

    /// Total attendees, moderators included.
    pub fn total(&self) -> u32 {
        self.participant_count.saturating_add(self.moderator_count)
    }
}

/// Kind of change carried by a presence event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceKind {
    /// A meeting started.
    Create,
    /// A meeting ended.
    Destroy,
    /// Someone entered a meeting.
    Join,
    /// Someone left a meeting.
    Leave,
}

impl PresenceKind {
    /// Returns the lowercase name used in logs and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Destroy => "destroy",
            Self::Join => "join",
            Self::Leave => "leave",
        }
    }
}

impl std::fmt::Display for PresenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A presence change scoped to a meeting and the room that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEvent {
    /// What happened.
    pub kind: PresenceKind,
    /// Meeting the event refers to.
    pub meeting: String,
    /// Owner of the meeting.
    pub room: String,
    /// Role of the attendee (only meaningful for join/leave).
    pub role: Role,
}

impl PresenceEvent {
    /// Creates an event of the given kind.
    pub fn new(
        kind: PresenceKind,
        meeting: impl Into<String>,
        room: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            kind,
            meeting: meeting.into(),
            room: room.into(),
            role,
        }
    }

    /// Creates a `create` event.
    pub fn create(meeting: impl Into<String>, room: impl Into<String>) -> Self {
        Self::new(PresenceKind::Create, meeting, room, Role::Participant)
    }

    /// Creates a `destroy` event.
    pub fn destroy(meeting: impl Into<String>, room: impl Into<String>) -> Self {
        Self::new(PresenceKind::Destroy, meeting, room, Role::Participant)
    }

    /// Creates a `join` event.
    pub fn join(meeting: impl Into<String>, room: impl Into<String>, role: Role) -> Self {
        Self::new(PresenceKind::Join, meeting, room, role)
    }

    /// Creates a `leave` event.
    pub fn leave(meeting: impl Into<String>, room: impl Into<String>, role: Role) -> Self {
        Self::new(PresenceKind::Leave, meeting, room, role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_from_wire() {
        assert_eq!(Role::from_wire(Some("MODERATOR")), Role::Moderator);
        assert_eq!(Role::from_wire(Some("VIEWER")), Role::Participant);
        assert_eq!(Role::from_wire(Some("moderator")), Role::Participant);
        assert_eq!(Role::from_wire(None), Role::Participant);
    }

    #[test]
    fn presence_from_totals() {
        let presence = MeetingPresence::from_totals("Room A", 5, 2);
        assert_eq!(presence.participant_count, 3);
        assert_eq!(presence.moderator_count, 2);
        assert_eq!(presence.total(), 5);
    }

    #[test]
    fn presence_from_inconsistent_totals() {
        // More moderators than attendees: participants saturate at zero
        let presence = MeetingPresence::from_totals("Room A", 1, 3);
        assert_eq!(presence.participant_count, 0);
        assert_eq!(presence.moderator_count, 3);
    }

    #[test]
    fn presence_count_by_role() {
        let presence = MeetingPresence::new("Room A", 4, 1);
        assert_eq!(presence.count(Role::Participant), 4);
        assert_eq!(presence.count(Role::Moderator), 1);
    }

    #[test]
    fn event_constructors() {
        let event = PresenceEvent::join("Room A", "user-1", Role::Moderator);
        assert_eq!(event.kind, PresenceKind::Join);
        assert_eq!(event.meeting, "Room A");
        assert_eq!(event.room, "user-1");
        assert_eq!(event.role, Role::Moderator);

        assert_eq!(PresenceEvent::destroy("x", "y").kind.to_string(), "destroy");
    }
}
