//! Row text formatting.

use crate::presence::MeetingPresence;

/// Formats `count` followed by the singular or plural noun.
pub fn pluralize(count: u32, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Formats the attendee counts, e.g. `(3 users, 1 mod)`.
pub fn counts_text(presence: &MeetingPresence) -> String {
    format!(
        "({}, {})",
        pluralize(presence.participant_count, "user", "users"),
        pluralize(presence.moderator_count, "mod", "mods")
    )
}

/// Formats a full row, e.g. `Room A (3 users, 1 mod)`.
pub fn row_text(presence: &MeetingPresence) -> String {
    format!("{} {}", presence.name, counts_text(presence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluralization() {
        assert_eq!(pluralize(0, "user", "users"), "0 users");
        assert_eq!(pluralize(1, "user", "users"), "1 user");
        assert_eq!(pluralize(2, "mod", "mods"), "2 mods");
    }

    #[test]
    fn row() {
        assert_eq!(
            row_text(&MeetingPresence::new("Room A", 3, 2)),
            "Room A (3 users, 2 mods)"
        );
        assert_eq!(
            row_text(&MeetingPresence::new("Standup", 1, 1)),
            "Standup (1 user, 1 mod)"
        );
        assert_eq!(
            counts_text(&MeetingPresence::empty("x")),
            "(0 users, 0 mods)"
        );
    }
}
