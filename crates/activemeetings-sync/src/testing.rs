//! Test doubles shared by the reconcile, join and session tests.

use std::collections::BTreeMap;

use activemeetings_core::{MeetingPresence, Presenter};

/// One call received by [`RecordingPresenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterCall {
    RenderRow(MeetingPresence),
    RemoveRow(String),
    UpdateRowText(MeetingPresence),
    ShowList,
    HideSpinner,
    PrunePrevious(Vec<String>),
    RestorePrevious(String),
    WaitForModerator(String),
    Navigate(String),
    FlagMissingName,
}

/// Presenter that records every call and mirrors the visible state.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub calls: Vec<PresenterCall>,
    pub rows: BTreeMap<String, MeetingPresence>,
    pub previous: Vec<String>,
    pub list_visible: bool,
}

impl RecordingPresenter {
    pub fn with_previous<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            previous: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn row(&self, name: &str) -> Option<&MeetingPresence> {
        self.rows.get(name)
    }

    pub fn count(&self, call: &PresenterCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn navigations(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                PresenterCall::Navigate(url) => Some(url.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn render_row(&mut self, presence: &MeetingPresence) {
        self.rows.insert(presence.name.clone(), presence.clone());
        self.calls.push(PresenterCall::RenderRow(presence.clone()));
    }

    fn remove_row(&mut self, name: &str) {
        self.rows.remove(name);
        self.calls.push(PresenterCall::RemoveRow(name.to_string()));
    }

    fn update_row_text(&mut self, presence: &MeetingPresence) {
        if let Some(row) = self.rows.get_mut(&presence.name) {
            *row = presence.clone();
        }
        self.calls.push(PresenterCall::UpdateRowText(presence.clone()));
    }

    fn show_list(&mut self) {
        self.list_visible = true;
        self.calls.push(PresenterCall::ShowList);
    }

    fn hide_spinner(&mut self) {
        self.calls.push(PresenterCall::HideSpinner);
    }

    fn prune_previous(&mut self, active: &[String]) {
        self.previous.retain(|name| !active.contains(name));
        self.calls.push(PresenterCall::PrunePrevious(active.to_vec()));
    }

    fn restore_previous(&mut self, name: &str) {
        if !self.previous.iter().any(|n| n == name) {
            self.previous.push(name.to_string());
        }
        self.calls.push(PresenterCall::RestorePrevious(name.to_string()));
    }

    fn wait_for_moderator(&mut self, status_url: &str) {
        self.calls
            .push(PresenterCall::WaitForModerator(status_url.to_string()));
    }

    fn navigate(&mut self, url: &str) {
        self.calls.push(PresenterCall::Navigate(url.to_string()));
    }

    fn flag_missing_name(&mut self) {
        self.calls.push(PresenterCall::FlagMissingName);
    }
}
