//! In-memory registry of active meetings.
//!
//! The registry maps meeting names to [`MeetingPresence`] records. A key
//! being present means the meeting is considered running and visible to
//! this client. Every mutation returns a [`RegistryChange`] so the caller
//! can mirror it into the presentation layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::presence::{MeetingPresence, Role};

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Protocol violations detected while applying a change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A count adjustment referenced a meeting that is not registered.
    #[error("unknown meeting: {name}")]
    UnknownMeeting { name: String },

    /// A count adjustment would have driven a count below zero.
    #[error("{role:?} count for {name} would drop below zero (current: {current}, delta: {delta})")]
    CountUnderflow {
        name: String,
        role: Role,
        current: u32,
        delta: i32,
    },
}

/// What to do when an adjustment would make a count negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountPolicy {
    /// Floor the count at zero and report the clamp.
    #[default]
    Clamp,
    /// Leave the entry untouched and return [`RegistryError::CountUnderflow`].
    Reject,
}

/// A change to apply to one registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceDelta {
    /// Insert the entry, or overwrite it, with absolute counts.
    Reset { participants: u32, moderators: u32 },
    /// Add `by` to the count for `role`. The entry must exist.
    Adjust { role: Role, by: i32 },
}

impl PresenceDelta {
    /// A fresh meeting with nobody in it.
    pub fn zeroed() -> Self {
        Self::Reset {
            participants: 0,
            moderators: 0,
        }
    }

    /// Absolute counts taken from an existing record.
    pub fn reset_to(presence: &MeetingPresence) -> Self {
        Self::Reset {
            participants: presence.participant_count,
            moderators: presence.moderator_count,
        }
    }

    /// One attendee entered.
    pub fn join(role: Role) -> Self {
        Self::Adjust { role, by: 1 }
    }

    /// One attendee left.
    pub fn leave(role: Role) -> Self {
        Self::Adjust { role, by: -1 }
    }
}

/// Outcome of a successful registry mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryChange {
    /// A new entry was created.
    Inserted(MeetingPresence),
    /// An existing entry changed. `clamped` is set when a count was floored
    /// at zero under [`CountPolicy::Clamp`].
    Updated {
        presence: MeetingPresence,
        clamped: bool,
    },
    /// An entry was removed.
    Removed(MeetingPresence),
}

impl RegistryChange {
    /// Returns the record affected by the change.
    pub fn presence(&self) -> &MeetingPresence {
        match self {
            Self::Inserted(presence) | Self::Removed(presence) => presence,
            Self::Updated { presence, .. } => presence,
        }
    }
}

/// Registry of active meetings keyed by name.
#[derive(Debug, Default)]
pub struct MeetingRegistry {
    policy: CountPolicy,
    meetings: BTreeMap<String, MeetingPresence>,
}

impl MeetingRegistry {
    /// Creates an empty registry with the given underflow policy.
    pub fn new(policy: CountPolicy) -> Self {
        Self {
            policy,
            meetings: BTreeMap::new(),
        }
    }

    /// Returns the underflow policy.
    pub fn policy(&self) -> CountPolicy {
        self.policy
    }

    /// Applies `delta` to the entry for `name`.
    ///
    /// `Reset` always succeeds. `Adjust` fails without side effects on a
    /// missing entry, and on underflow when the policy is `Reject`.
    pub fn upsert(&mut self, name: &str, delta: PresenceDelta) -> RegistryResult<RegistryChange> {
        match delta {
            PresenceDelta::Reset {
                participants,
                moderators,
            } => {
                let presence = MeetingPresence::new(name, participants, moderators);
                match self.meetings.insert(name.to_string(), presence.clone()) {
                    Some(_) => {
                        debug!(meeting = %name, participants, moderators, "Reset meeting presence");
                        Ok(RegistryChange::Updated {
                            presence,
                            clamped: false,
                        })
                    }
                    None => {
                        debug!(meeting = %name, participants, moderators, "Registered meeting");
                        Ok(RegistryChange::Inserted(presence))
                    }
                }
            }
            PresenceDelta::Adjust { role, by } => {
                let policy = self.policy;
                let entry =
                    self.meetings
                        .get_mut(name)
                        .ok_or_else(|| RegistryError::UnknownMeeting {
                            name: name.to_string(),
                        })?;

                let current = entry.count(role);
                let next = i64::from(current) + i64::from(by);
                let clamped = next < 0;
                if clamped {
                    match policy {
                        CountPolicy::Reject => {
                            return Err(RegistryError::CountUnderflow {
                                name: name.to_string(),
                                role,
                                current,
                                delta: by,
                            });
                        }
                        CountPolicy::Clamp => {
                            warn!(meeting = %name, ?role, current, delta = by, "Count underflow, clamping to zero");
                        }
                    }
                }

                *entry.count_mut(role) = u32::try_from(next.max(0)).unwrap_or(u32::MAX);
                trace!(
                    meeting = %name,
                    participants = entry.participant_count,
                    moderators = entry.moderator_count,
                    "Adjusted meeting presence"
                );

                Ok(RegistryChange::Updated {
                    presence: entry.clone(),
                    clamped,
                })
            }
        }
    }

    /// Removes the entry for `name`. Removing a missing entry is a no-op
    /// returning `None`.
    pub fn remove(&mut self, name: &str) -> Option<RegistryChange> {
        let removed = self.meetings.remove(name)?;
        debug!(meeting = %name, "Removed meeting");
        Some(RegistryChange::Removed(removed))
    }

    /// Gets the entry for `name`.
    pub fn get(&self, name: &str) -> Option<&MeetingPresence> {
        self.meetings.get(name)
    }

    /// Returns true if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.meetings.contains_key(name)
    }

    /// Returns registered names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.meetings.keys().map(String::as_str)
    }

    /// Returns registered records in name order.
    pub fn iter(&self) -> impl Iterator<Item = &MeetingPresence> {
        self.meetings.values()
    }

    /// Returns the number of registered meetings.
    pub fn len(&self) -> usize {
        self.meetings.len()
    }

    /// Returns true if no meeting is registered.
    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_inserts_then_updates() {
        let mut registry = MeetingRegistry::default();

        let change = registry.upsert("Room A", PresenceDelta::zeroed()).unwrap();
        assert_eq!(change, RegistryChange::Inserted(MeetingPresence::empty("Room A")));

        let change = registry
            .upsert(
                "Room A",
                PresenceDelta::Reset {
                    participants: 3,
                    moderators: 2,
                },
            )
            .unwrap();
        assert_eq!(
            change,
            RegistryChange::Updated {
                presence: MeetingPresence::new("Room A", 3, 2),
                clamped: false,
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn adjust_counts_by_role() {
        let mut registry = MeetingRegistry::default();
        registry.upsert("Room A", PresenceDelta::zeroed()).unwrap();

        registry
            .upsert("Room A", PresenceDelta::join(Role::Moderator))
            .unwrap();
        registry
            .upsert("Room A", PresenceDelta::join(Role::Participant))
            .unwrap();
        registry
            .upsert("Room A", PresenceDelta::join(Role::Participant))
            .unwrap();
        let change = registry
            .upsert("Room A", PresenceDelta::leave(Role::Participant))
            .unwrap();

        assert_eq!(change.presence(), &MeetingPresence::new("Room A", 1, 1));
    }

    #[test]
    fn adjust_unknown_meeting_is_rejected() {
        let mut registry = MeetingRegistry::default();

        let err = registry
            .upsert("ghost", PresenceDelta::join(Role::Participant))
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::UnknownMeeting {
                name: "ghost".to_string()
            }
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn underflow_clamps_by_default() {
        let mut registry = MeetingRegistry::new(CountPolicy::Clamp);
        registry.upsert("Room A", PresenceDelta::zeroed()).unwrap();

        let change = registry
            .upsert("Room A", PresenceDelta::leave(Role::Moderator))
            .unwrap();

        assert_eq!(
            change,
            RegistryChange::Updated {
                presence: MeetingPresence::empty("Room A"),
                clamped: true,
            }
        );
    }

    #[test]
    fn underflow_rejected_leaves_entry_untouched() {
        let mut registry = MeetingRegistry::new(CountPolicy::Reject);
        registry
            .upsert(
                "Room A",
                PresenceDelta::Reset {
                    participants: 2,
                    moderators: 0,
                },
            )
            .unwrap();

        let err = registry
            .upsert("Room A", PresenceDelta::leave(Role::Moderator))
            .unwrap_err();

        assert!(matches!(
            err,
            RegistryError::CountUnderflow {
                current: 0,
                delta: -1,
                role: Role::Moderator,
                ..
            }
        ));
        assert_eq!(
            registry.get("Room A"),
            Some(&MeetingPresence::new("Room A", 2, 0))
        );
    }

    #[test]
    fn remove_is_idempotent() {
        let mut registry = MeetingRegistry::default();
        registry.upsert("Room A", PresenceDelta::zeroed()).unwrap();

        registry
            .upsert("Room A", PresenceDelta::join(Role::Moderator))
            .unwrap();

        assert_eq!(
            registry.remove("Room A"),
            Some(RegistryChange::Removed(MeetingPresence::new("Room A", 0, 1)))
        );
        assert!(registry.remove("Room A").is_none());
        assert!(!registry.contains("Room A"));
    }

    #[test]
    fn names_are_ordered() {
        let mut registry = MeetingRegistry::default();
        registry.upsert("b", PresenceDelta::zeroed()).unwrap();
        registry.upsert("a", PresenceDelta::zeroed()).unwrap();
        registry.upsert("c", PresenceDelta::zeroed()).unwrap();

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let counts: Vec<_> = registry.iter().map(MeetingPresence::total).collect();
        assert_eq!(counts, vec![0, 0, 0]);
    }

    #[test]
    fn policy_serde() {
        let json = serde_json::to_string(&CountPolicy::Reject).unwrap();
        assert_eq!(json, r#""reject""#);
        let parsed: CountPolicy = serde_json::from_str(r#""clamp""#).unwrap();
        assert_eq!(parsed, CountPolicy::Clamp);
    }
}
