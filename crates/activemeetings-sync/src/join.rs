//! Join initiator.
//!
//! A join goes through three steps so the session loop can keep the
//! network request off its state:
//!
//! 1. [`JoinInitiator::prepare`] checks the meeting name and the stored
//!    display name;
//! 2. [`JoinInitiator::request`] asks the join service;
//! 3. [`JoinInitiator::complete`] hands the decision to the presenter.
//!
//! [`JoinInitiator::join`] runs all three in order. No timeout is imposed.

use std::fmt;
use std::sync::Arc;

use activemeetings_core::{MembershipStore, Presenter};
use activemeetings_protocol::JoinDecision;
use activemeetings_providers::{BoxFuture, JoinService, ProviderResult};
use tracing::{debug, info, warn};

/// Result of a join attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// No meeting name was given; nothing happened.
    Skipped,
    /// No display name is stored; the name input was flagged.
    MissingDisplayName,
    /// The presenter is waiting for a moderator, polling `status_url`.
    WaitForModerator { status_url: String },
    /// The presenter navigated to `join_url`.
    Redirect { join_url: String },
    /// The request failed; nothing was navigated.
    TransportFailed,
}

impl fmt::Display for JoinOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => f.write_str("skipped"),
            Self::MissingDisplayName => f.write_str("missing display name"),
            Self::WaitForModerator { status_url } => {
                write!(f, "waiting for a moderator ({})", status_url)
            }
            Self::Redirect { join_url } => write!(f, "joining {}", join_url),
            Self::TransportFailed => f.write_str("meeting join failed"),
        }
    }
}

/// A join that passed the local checks and is ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingJoin {
    meeting: String,
    display_name: String,
}

impl PendingJoin {
    /// Returns the meeting to join.
    pub fn meeting(&self) -> &str {
        &self.meeting
    }

    /// Returns the display name to join with.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Future of an in-flight join request.
pub type JoinFuture = BoxFuture<'static, (PendingJoin, ProviderResult<JoinDecision>)>;

/// Turns a click on a meeting into a join request.
#[derive(Clone)]
pub struct JoinInitiator {
    service: Arc<dyn JoinService>,
}

impl JoinInitiator {
    /// Creates an initiator backed by `service`.
    pub fn new(service: Arc<dyn JoinService>) -> Self {
        Self { service }
    }

    /// Checks the preconditions of a join.
    ///
    /// Returns the outcome directly when the join stops here: a missing or
    /// empty meeting name is skipped silently, a missing display name flags
    /// the name input on the presenter.
    pub fn prepare<S, P>(
        meeting: Option<&str>,
        store: &S,
        presenter: &mut P,
    ) -> Result<PendingJoin, JoinOutcome>
    where
        S: MembershipStore + ?Sized,
        P: Presenter + ?Sized,
    {
        let Some(meeting) = meeting.filter(|name| !name.is_empty()) else {
            debug!("Join without a meeting name, ignoring");
            return Err(JoinOutcome::Skipped);
        };

        let Some(display_name) = store.display_name() else {
            debug!(meeting = %meeting, "No display name stored, cannot join");
            presenter.flag_missing_name();
            return Err(JoinOutcome::MissingDisplayName);
        };

        Ok(PendingJoin {
            meeting: meeting.to_string(),
            display_name,
        })
    }

    /// Sends the join request.
    pub fn request(&self, pending: PendingJoin) -> JoinFuture {
        let service = Arc::clone(&self.service);
        Box::pin(async move {
            debug!(meeting = %pending.meeting, "Requesting to join");
            let result = service
                .request_join(&pending.meeting, &pending.display_name)
                .await;
            (pending, result)
        })
    }

    /// Applies the service's answer to the presenter.
    pub fn complete<P>(
        pending: &PendingJoin,
        result: ProviderResult<JoinDecision>,
        presenter: &mut P,
    ) -> JoinOutcome
    where
        P: Presenter + ?Sized,
    {
        match result {
            Ok(JoinDecision::WaitForModerator { status_url }) => {
                info!(meeting = %pending.meeting, status_url = %status_url, "Waiting for a moderator");
                presenter.wait_for_moderator(&status_url);
                JoinOutcome::WaitForModerator { status_url }
            }
            Ok(JoinDecision::Redirect { join_url }) => {
                info!(meeting = %pending.meeting, "Joining meeting");
                presenter.navigate(&join_url);
                JoinOutcome::Redirect { join_url }
            }
            Err(err) => {
                warn!(meeting = %pending.meeting, error = %err, "Meeting join failed");
                JoinOutcome::TransportFailed
            }
        }
    }

    /// Runs a whole join: checks, request, presenter update.
    pub async fn join<S, P>(&self, meeting: Option<&str>, store: &S, presenter: &mut P) -> JoinOutcome
    where
        S: MembershipStore + ?Sized,
        P: Presenter + ?Sized,
    {
        let pending = match Self::prepare(meeting, store, presenter) {
            Ok(pending) => pending,
            Err(outcome) => return outcome,
        };
        let (pending, result) = self.request(pending).await;
        Self::complete(&pending, result, presenter)
    }
}

impl fmt::Debug for JoinInitiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinInitiator").finish_non_exhaustive()
    }
}
