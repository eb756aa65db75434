//! Client-persisted membership history.
//!
//! The persisted store is a plain key-value store owned by the host. The
//! core only reads it: the list of meetings this client joined before is
//! kept as a comma-joined string under `joinedRooms-<user>`, and the last
//! display name used to join under `lastJoinedName`.

use std::collections::HashMap;
use std::sync::Arc;

/// Prefix of the per-user key holding previously joined meeting names.
pub const JOINED_ROOMS_PREFIX: &str = "joinedRooms-";

/// Key holding the display name last used to join a meeting.
pub const LAST_JOINED_NAME_KEY: &str = "lastJoinedName";

/// Returns the store key for `user`'s previously joined meetings.
pub fn joined_rooms_key(user: &str) -> String {
    format!("{JOINED_ROOMS_PREFIX}{user}")
}

/// Read access to the persisted key-value store.
pub trait MembershipStore {
    /// Returns the raw value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Returns the meetings `user` has joined before from this client.
    fn previously_joined(&self, user: &str) -> PreviouslyJoined {
        PreviouslyJoined::parse(self.get(&joined_rooms_key(user)).as_deref())
    }

    /// Returns the display name to join with, if one is stored and not blank.
    fn display_name(&self) -> Option<String> {
        self.get(LAST_JOINED_NAME_KEY)
            .filter(|name| !name.trim().is_empty())
    }
}

impl<T: MembershipStore + ?Sized> MembershipStore for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

impl<T: MembershipStore + ?Sized> MembershipStore for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// Set of meeting names joined before, in stored order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviouslyJoined {
    names: Vec<String>,
}

impl PreviouslyJoined {
    /// Parses the stored comma-joined value. A missing or empty value is
    /// the empty set. Names are matched exactly, so they are not trimmed.
    pub fn parse(value: Option<&str>) -> Self {
        let mut joined = Self::default();
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            for name in value.split(',') {
                joined.insert(name);
            }
        }
        joined
    }

    /// Returns true if `meeting` was joined before.
    pub fn contains(&self, meeting: &str) -> bool {
        self.names.iter().any(|name| name == meeting)
    }

    /// Adds `meeting` unless already present. Returns true if added.
    pub fn insert(&mut self, meeting: &str) -> bool {
        if self.contains(meeting) {
            return false;
        }
        self.names.push(meeting.to_string());
        true
    }

    /// Returns the names in stored order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns the number of names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no meeting was joined before.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the value to persist.
    pub fn to_stored(&self) -> String {
        self.names.join(",")
    }
}

/// In-memory store, used by tests and embedders without persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Removes `key`.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Builder: record `meetings` as previously joined by `user`.
    pub fn with_joined<I, S>(mut self, user: &str, meetings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut joined = self.previously_joined(user);
        for meeting in meetings {
            joined.insert(meeting.as_ref());
        }
        self.set(joined_rooms_key(user), joined.to_stored());
        self
    }

    /// Builder: set the display name used when joining.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.set(LAST_JOINED_NAME_KEY, name);
        self
    }
}

impl MembershipStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_missing_or_empty() {
        assert!(PreviouslyJoined::parse(None).is_empty());
        assert!(PreviouslyJoined::parse(Some("")).is_empty());
    }

    #[test]
    fn parse_comma_joined() {
        let joined = PreviouslyJoined::parse(Some("Room A,Standup,Room A"));
        assert_eq!(joined.len(), 2);
        assert!(joined.contains("Room A"));
        assert!(joined.contains("Standup"));
        assert!(!joined.contains("Room"));
        assert_eq!(joined.to_stored(), "Room A,Standup");
    }

    #[test]
    fn names_match_exactly() {
        let joined = PreviouslyJoined::parse(Some("Room A, Standup"));
        assert!(joined.contains(" Standup"));
        assert!(!joined.contains("Standup"));
    }

    #[test]
    fn key_is_per_user() {
        assert_eq!(joined_rooms_key("42"), "joinedRooms-42");
    }

    #[test]
    fn memory_store_previously_joined() {
        let store = MemoryStore::new()
            .with_joined("u1", ["Room A"])
            .with_joined("u1", ["Room B"]);

        let joined = store.previously_joined("u1");
        assert!(joined.contains("Room A"));
        assert!(joined.contains("Room B"));
        assert!(store.previously_joined("u2").is_empty());
    }

    #[test]
    fn display_name_ignores_blank() {
        let store = MemoryStore::new().with_display_name("   ");
        assert_eq!(store.display_name(), None);

        let store = MemoryStore::new().with_display_name("Ada");
        assert_eq!(store.display_name(), Some("Ada".to_string()));
    }

    #[test]
    fn shared_store_delegates() {
        let store: Arc<dyn MembershipStore + Send + Sync> =
            Arc::new(MemoryStore::new().with_joined("u1", ["Room A"]));
        assert!(store.previously_joined("u1").contains("Room A"));
    }
}
