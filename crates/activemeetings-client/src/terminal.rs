//! Terminal presenter.
//!
//! Prints one line per change. Rows are tagged with their [`RowHandle`],
//! never with the meeting name, so names with spaces or punctuation are
//! safe:
//!
//! ```text
//! + row-1 Room A (3 users, 2 mods)
//! ~ row-1 Room A (3 users, 3 mods)
//! - row-1 Room A
//! ```

use std::collections::BTreeMap;
use std::io::{self, Write};

use activemeetings_core::{row_text, MeetingPresence, Presenter, RowHandle, RowTable};
use tracing::{debug, info, warn};

/// Presenter writing to a terminal (or any writer).
pub struct TerminalPresenter<W = io::Stdout> {
    out: W,
    rows: RowTable,
    texts: BTreeMap<RowHandle, String>,
    previous: Vec<String>,
    list_visible: bool,
    open_browser: bool,
}

impl TerminalPresenter<io::Stdout> {
    /// Creates a presenter writing to stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalPresenter<W> {
    /// Creates a presenter writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            rows: RowTable::new(),
            texts: BTreeMap::new(),
            previous: Vec::new(),
            list_visible: false,
            open_browser: false,
        }
    }

    /// Builder: open join URLs in the default browser.
    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    /// Builder: seed the previously-joined list shown next to the rows.
    pub fn with_previous<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.previous.contains(&name) {
                self.previous.push(name);
            }
        }
        self
    }

    /// Returns the previously-joined list as currently shown.
    pub fn previous(&self) -> &[String] {
        &self.previous
    }

    /// Returns true once the initial load revealed the list.
    pub fn is_list_visible(&self) -> bool {
        self.list_visible
    }

    /// Returns the number of rendered rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, line: std::fmt::Arguments<'_>) {
        if let Err(err) = self.out.write_fmt(line).and_then(|()| self.out.write_all(b"\n")) {
            warn!(error = %err, "Failed to write to terminal");
        }
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render_row(&mut self, presence: &MeetingPresence) {
        let (handle, created) = self.rows.attach(&presence.name);
        let text = row_text(presence);
        let marker = if created { '+' } else { '~' };
        self.line(format_args!("{} {} {}", marker, handle, text));
        self.texts.insert(handle, text);
    }

    fn remove_row(&mut self, name: &str) {
        if let Some(handle) = self.rows.detach(name) {
            self.texts.remove(&handle);
            self.line(format_args!("- {} {}", handle, name));
        }
    }

    fn update_row_text(&mut self, presence: &MeetingPresence) {
        let Some(handle) = self.rows.get(&presence.name) else {
            debug!(meeting = %presence.name, "No row to update");
            return;
        };
        let text = row_text(presence);
        self.line(format_args!("~ {} {}", handle, text));
        self.texts.insert(handle, text);
    }

    fn show_list(&mut self) {
        self.list_visible = true;
        let rows: Vec<String> = self.texts.values().cloned().collect();
        self.line(format_args!("Active meetings: {}", rows.len()));
        for row in rows {
            self.line(format_args!("  {}", row));
        }
        if !self.previous.is_empty() {
            let previous = self.previous.join(", ");
            self.line(format_args!("Previously joined: {}", previous));
        }
    }

    fn hide_spinner(&mut self) {
        debug!("Initial load finished");
    }

    fn prune_previous(&mut self, active: &[String]) {
        self.previous.retain(|name| !active.contains(name));
    }

    fn restore_previous(&mut self, name: &str) {
        if !self.previous.iter().any(|n| n == name) {
            self.previous.push(name.to_string());
        }
    }

    fn wait_for_moderator(&mut self, status_url: &str) {
        self.line(format_args!(
            "Waiting for a moderator to start the meeting: {}",
            status_url
        ));
    }

    fn navigate(&mut self, url: &str) {
        self.line(format_args!("Join: {}", url));
        if self.open_browser {
            info!(url = %url, "Opening join URL");
            if let Err(err) = open::that(url) {
                warn!(error = %err, "Failed to open URL");
            }
        }
    }

    fn flag_missing_name(&mut self) {
        self.line(format_args!(
            "No display name stored. Run: activemeetings remember --name NAME"
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(presenter: TerminalPresenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    #[test]
    fn rows_use_handles() {
        let mut presenter = TerminalPresenter::new(Vec::new());
        presenter.render_row(&MeetingPresence::new("Room A", 3, 2));
        presenter.update_row_text(&MeetingPresence::new("Room A", 3, 3));
        presenter.remove_row("Room A");
        presenter.render_row(&MeetingPresence::new("Room A", 0, 1));

        assert_eq!(
            output(presenter),
            "+ row-1 Room A (3 users, 2 mods)\n\
             ~ row-1 Room A (3 users, 3 mods)\n\
             - row-1 Room A\n\
             + row-2 Room A (0 users, 1 mod)\n"
        );
    }

    #[test]
    fn update_and_remove_without_row_are_silent() {
        let mut presenter = TerminalPresenter::new(Vec::new());
        presenter.update_row_text(&MeetingPresence::new("Room A", 1, 1));
        presenter.remove_row("Room A");
        assert_eq!(presenter.row_count(), 0);
        assert_eq!(output(presenter), "");
    }

    #[test]
    fn show_list_includes_previous() {
        let mut presenter =
            TerminalPresenter::new(Vec::new()).with_previous(["Room A", "Room B"]);
        presenter.render_row(&MeetingPresence::new("Room A", 1, 0));
        presenter.prune_previous(&["Room A".to_string()]);
        presenter.restore_previous("Room C");
        presenter.restore_previous("Room C");
        presenter.show_list();

        assert!(presenter.is_list_visible());
        assert_eq!(presenter.previous(), ["Room B", "Room C"]);
        let text = output(presenter);
        assert!(text.contains("Active meetings: 1\n  Room A (1 user, 0 mods)\n"));
        assert!(text.ends_with("Previously joined: Room B, Room C\n"));
    }

    #[test]
    fn join_outcomes_are_printed() {
        let mut presenter = TerminalPresenter::new(Vec::new());
        presenter.wait_for_moderator("https://meet.example.com/rooms/abc/Room%20A");
        presenter.navigate("https://meet.example.com/join/1");
        presenter.flag_missing_name();

        let text = output(presenter);
        assert!(text.contains("Waiting for a moderator"));
        assert!(text.contains("Join: https://meet.example.com/join/1"));
        assert!(text.contains("remember --name"));
    }
}
