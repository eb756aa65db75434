//! Payload types for the presence channel and the HTTP endpoints.

use activemeetings_core::{MeetingPresence, PresenceEvent, PresenceKind, Role};
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

/// `messageKey` value telling the client to wait for a moderator.
pub const WAIT_FOR_MODERATOR: &str = "wait_for_moderator";

/// Method of a presence channel message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventMethod {
    Create,
    Destroy,
    Join,
    Leave,
}

impl From<EventMethod> for PresenceKind {
    fn from(method: EventMethod) -> Self {
        match method {
            EventMethod::Create => Self::Create,
            EventMethod::Destroy => Self::Destroy,
            EventMethod::Join => Self::Join,
            EventMethod::Leave => Self::Leave,
        }
    }
}

/// One message pushed by the meetings channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMessage {
    /// What happened.
    pub method: EventMethod,
    /// Meeting name.
    pub meeting: String,
    /// Owner of the meeting.
    pub room: String,
    /// Attendee role, `MODERATOR` or anything else.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl EventMessage {
    /// Creates a message without a role.
    pub fn new(method: EventMethod, meeting: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            method,
            meeting: meeting.into(),
            room: room.into(),
            role: None,
        }
    }

    /// Builder: set the role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

impl From<EventMessage> for PresenceEvent {
    fn from(message: EventMessage) -> Self {
        let role = Role::from_wire(message.role.as_deref());
        PresenceEvent::new(message.method.into(), message.meeting, message.room, role)
    }
}

/// Accepts a count as a JSON integer or as a decimal string.
fn count_from_str_or_int<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Unexpected};

    struct Count;

    impl<'de> de::Visitor<'de> for Count {
        type Value = u32;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a non-negative count as an integer or a decimal string")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<u32, E> {
            u32::try_from(value).map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<u32, E> {
            u32::try_from(value).map_err(|_| E::invalid_value(Unexpected::Signed(value), &self))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<u32, E> {
            value
                .trim()
                .parse()
                .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(Count)
}

/// Metadata attached to a running meeting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingMetadata {
    /// Room that owns the meeting.
    #[serde(rename = "room-id", default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

/// One running meeting as reported by the snapshot endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDescriptor {
    /// Meeting name.
    pub meeting_name: String,
    /// Ownership metadata.
    #[serde(default)]
    pub metadata: MeetingMetadata,
    /// All attendees, moderators included.
    #[serde(default, deserialize_with = "count_from_str_or_int")]
    pub participant_count: u32,
    /// Moderator attendees.
    #[serde(default, deserialize_with = "count_from_str_or_int")]
    pub moderator_count: u32,
}

impl MeetingDescriptor {
    /// Creates a descriptor owned by `room_id`.
    pub fn new(
        meeting_name: impl Into<String>,
        room_id: impl Into<String>,
        participant_count: u32,
        moderator_count: u32,
    ) -> Self {
        Self {
            meeting_name: meeting_name.into(),
            metadata: MeetingMetadata {
                room_id: Some(room_id.into()),
            },
            participant_count,
            moderator_count,
        }
    }

    /// Returns the owning room, if tagged.
    pub fn room_id(&self) -> Option<&str> {
        self.metadata.room_id.as_deref()
    }

    /// Converts to a presence record, splitting moderators out of the total.
    pub fn presence(&self) -> MeetingPresence {
        MeetingPresence::from_totals(
            &self.meeting_name,
            self.participant_count,
            self.moderator_count,
        )
    }
}

/// Body returned by the snapshot endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotResponse {
    /// Running meetings, across all rooms.
    #[serde(default)]
    pub meetings: Vec<MeetingDescriptor>,
}

/// Body sent to the join endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Meeting to join.
    pub meeting: String,
    /// Display name shown to other attendees.
    pub join_name: String,
}

/// Inner part of a join response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResponseBody {
    /// Where to send the browser.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_url: Option<String>,
}

/// Body returned by the join endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    /// Set to [`WAIT_FOR_MODERATOR`] when nobody can admit the user yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_key: Option<String>,
    /// Present when the user can join right away.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<JoinResponseBody>,
}

/// What the client should do after asking to join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinDecision {
    /// No moderator is present yet; poll `status_url`.
    WaitForModerator { status_url: String },
    /// Navigate to `join_url`.
    Redirect { join_url: String },
}

impl JoinResponse {
    /// Interprets the response. `status_url` is where waiting clients poll.
    pub fn decision(self, status_url: &str) -> ProtocolResult<JoinDecision> {
        if self.message_key.as_deref() == Some(WAIT_FOR_MODERATOR) {
            return Ok(JoinDecision::WaitForModerator {
                status_url: status_url.to_string(),
            });
        }

        self.response
            .and_then(|body| body.join_url)
            .map(|join_url| JoinDecision::Redirect { join_url })
            .ok_or(ProtocolError::MissingJoinUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_message_serde() {
        let message = EventMessage::new(EventMethod::Join, "Room A", "u1").with_role("MODERATOR");
        let json = serde_json::to_string(&message).unwrap();
        insta::assert_snapshot!(json, @r#"{"method":"join","meeting":"Room A","room":"u1","role":"MODERATOR"}"#);

        let parsed: EventMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn event_message_without_role() {
        let json = r#"{"method":"destroy","meeting":"Room A","room":"u1"}"#;
        let message: EventMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.role, None);

        let event = PresenceEvent::from(message);
        assert_eq!(event, PresenceEvent::destroy("Room A", "u1"));
    }

    #[test]
    fn event_message_role_mapping() {
        let json = r#"{"method":"leave","meeting":"Room A","room":"u1","role":"VIEWER"}"#;
        let event: PresenceEvent = serde_json::from_str::<EventMessage>(json).unwrap().into();
        assert_eq!(event, PresenceEvent::leave("Room A", "u1", Role::Participant));
    }

    #[test]
    fn event_message_unknown_method() {
        let json = r#"{"method":"rename","meeting":"Room A","room":"u1"}"#;
        assert!(serde_json::from_str::<EventMessage>(json).is_err());
    }

    #[test]
    fn snapshot_with_string_counts() {
        let json = r#"{
            "meetings": [
                {
                    "meetingName": "Room A",
                    "metadata": {"room-id": "u1"},
                    "participantCount": "5",
                    "moderatorCount": "2"
                },
                {
                    "meetingName": "Other",
                    "metadata": {"room-id": "u2"},
                    "participantCount": 1,
                    "moderatorCount": 0
                }
            ]
        }"#;
        let snapshot: SnapshotResponse = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.meetings.len(), 2);
        let first = &snapshot.meetings[0];
        assert_eq!(first.room_id(), Some("u1"));
        assert_eq!(first.presence(), MeetingPresence::new("Room A", 3, 2));
        assert_eq!(snapshot.meetings[1].room_id(), Some("u2"));
    }

    #[test]
    fn snapshot_missing_metadata_and_counts() {
        let json = r#"{"meetings":[{"meetingName":"Bare"}]}"#;
        let snapshot: SnapshotResponse = serde_json::from_str(json).unwrap();
        let bare = &snapshot.meetings[0];
        assert_eq!(bare.room_id(), None);
        assert_eq!(bare.presence(), MeetingPresence::empty("Bare"));
    }

    #[test]
    fn snapshot_rejects_bad_counts() {
        let negative = r#"{"meetings":[{"meetingName":"x","participantCount":-1}]}"#;
        assert!(serde_json::from_str::<SnapshotResponse>(negative).is_err());

        let garbage = r#"{"meetings":[{"meetingName":"x","moderatorCount":"many"}]}"#;
        assert!(serde_json::from_str::<SnapshotResponse>(garbage).is_err());
    }

    #[test]
    fn snapshot_empty_body() {
        let snapshot: SnapshotResponse = serde_json::from_str("{}").unwrap();
        assert!(snapshot.meetings.is_empty());
    }

    #[test]
    fn descriptor_serde() {
        let descriptor = MeetingDescriptor::new("Room A", "u1", 5, 2);
        let json = serde_json::to_string(&descriptor).unwrap();
        insta::assert_snapshot!(json, @r#"{"meetingName":"Room A","metadata":{"room-id":"u1"},"participantCount":5,"moderatorCount":2}"#);
    }

    #[test]
    fn join_request_serde() {
        let request = JoinRequest {
            meeting: "Room A".to_string(),
            join_name: "Ada".to_string(),
        };
        let json = serde_json::to_string(&request).unwrap();
        insta::assert_snapshot!(json, @r#"{"meeting":"Room A","join_name":"Ada"}"#);
    }

    #[test]
    fn join_decision_wait() {
        let json = r#"{"messageKey":"wait_for_moderator"}"#;
        let response: JoinResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.decision("https://x/rooms/a/Room%20A").unwrap(),
            JoinDecision::WaitForModerator {
                status_url: "https://x/rooms/a/Room%20A".to_string()
            }
        );
    }

    #[test]
    fn join_decision_redirect() {
        let json = r#"{"messageKey":"ok","response":{"join_url":"https://bbb/join?x=1"}}"#;
        let response: JoinResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.decision("unused").unwrap(),
            JoinDecision::Redirect {
                join_url: "https://bbb/join?x=1".to_string()
            }
        );
    }

    #[test]
    fn join_decision_missing_url() {
        let response: JoinResponse = serde_json::from_str(r#"{"response":{}}"#).unwrap();
        assert!(matches!(
            response.decision("unused"),
            Err(ProtocolError::MissingJoinUrl)
        ));
    }
}
