//! Room context of the landing page.
//!
//! Meetings are owned by a room, and the room is identified by the id of
//! the signed-in user. The page URL determines whether a snapshot can be
//! fetched at all and where it lives.

use url::Url;

/// Suffix appended to the page path to reach the snapshot endpoint.
pub const SNAPSHOT_SUFFIX: &str = "request";

/// Suffix appended to the page path to reach the join endpoint.
pub const JOIN_SUFFIX: &str = "join";

/// The signed-in user and the page they are looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomContext {
    user: String,
    page_url: Url,
}

impl RoomContext {
    /// Creates a context for `user` on `page_url`.
    pub fn new(user: impl Into<String>, page_url: Url) -> Self {
        Self {
            user: user.into(),
            page_url,
        }
    }

    /// Parses `page_url` and creates a context for `user`.
    pub fn parse(user: impl Into<String>, page_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(user, Url::parse(page_url)?))
    }

    /// Returns the signed-in user id, which is also their room id.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns the page URL.
    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    /// Returns true if meetings tagged with `room` belong to this user.
    pub fn owns(&self, room: &str) -> bool {
        room == self.user
    }

    /// Returns true if the page is a room page that can load meetings.
    ///
    /// The URL must mention `rooms`, and the parent path segment must not be
    /// the user id (that is the user's own home page).
    pub fn is_room_page(&self) -> bool {
        if !self.page_url.as_str().contains("rooms") {
            return false;
        }

        let segments: Vec<&str> = self
            .page_url
            .path_segments()
            .map(|segments| segments.collect())
            .unwrap_or_default();

        match segments.len().checked_sub(2).map(|i| segments[i]) {
            Some(parent) => parent != self.user,
            None => true,
        }
    }

    /// Returns the snapshot endpoint for this page.
    pub fn snapshot_url(&self) -> Url {
        self.with_suffix(SNAPSHOT_SUFFIX)
    }

    /// Returns the join endpoint for this page.
    pub fn join_url(&self) -> Url {
        self.with_suffix(JOIN_SUFFIX)
    }

    /// Returns the status URL of `meeting`, used while waiting for a moderator.
    pub fn meeting_url(&self, meeting: &str) -> Url {
        self.with_suffix(meeting)
    }

    fn with_suffix(&self, segment: &str) -> Url {
        let mut url = self.page_url.clone();
        url.set_fragment(None);
        url.set_query(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        url
    }
}
