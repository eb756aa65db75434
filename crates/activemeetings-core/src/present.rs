//! Presentation boundary.
//!
//! The core decides what is visible; a [`Presenter`] only reflects it. The
//! core never reads presentation state back.

use crate::presence::MeetingPresence;

/// Renders active meetings and the surrounding page state.
pub trait Presenter {
    /// Adds a row for a newly visible meeting.
    fn render_row(&mut self, presence: &MeetingPresence);

    /// Removes the row of a meeting that ended.
    fn remove_row(&mut self, name: &str);

    /// Refreshes the counts shown in an existing row.
    fn update_row_text(&mut self, presence: &MeetingPresence);

    /// Reveals the meeting lists once the initial load completed.
    fn show_list(&mut self);

    /// Hides the loading indicator.
    fn hide_spinner(&mut self);

    /// Drops entries from the previously-joined list that are running now.
    fn prune_previous(&mut self, active: &[String]);

    /// Puts `name` back in the previously-joined list, unless already there.
    fn restore_previous(&mut self, name: &str);

    /// Switches to the waiting state, polling `status_url`.
    fn wait_for_moderator(&mut self, status_url: &str);

    /// Leaves the page for `url`.
    fn navigate(&mut self, url: &str);

    /// Marks the user-name input as invalid.
    fn flag_missing_name(&mut self);
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn render_row(&mut self, presence: &MeetingPresence) {
        (**self).render_row(presence);
    }

    fn remove_row(&mut self, name: &str) {
        (**self).remove_row(name);
    }

    fn update_row_text(&mut self, presence: &MeetingPresence) {
        (**self).update_row_text(presence);
    }

    fn show_list(&mut self) {
        (**self).show_list();
    }

    fn hide_spinner(&mut self) {
        (**self).hide_spinner();
    }

    fn prune_previous(&mut self, active: &[String]) {
        (**self).prune_previous(active);
    }

    fn restore_previous(&mut self, name: &str) {
        (**self).restore_previous(name);
    }

    fn wait_for_moderator(&mut self, status_url: &str) {
        (**self).wait_for_moderator(status_url);
    }

    fn navigate(&mut self, url: &str) {
        (**self).navigate(url);
    }

    fn flag_missing_name(&mut self) {
        (**self).flag_missing_name();
    }
}
