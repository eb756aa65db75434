//! One-shot join.

use std::sync::Arc;

use activemeetings_providers::HttpJoinService;
use activemeetings_sync::{JoinInitiator, JoinOutcome};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::store::FileStore;
use crate::terminal::TerminalPresenter;

/// Asks to join `meeting` and prints the decision.
///
/// A successful decision also records the meeting as previously joined,
/// which is what makes it show up in `watch`.
pub async fn join(
    config: &ClientConfig,
    meeting: &str,
    page_url: Option<&str>,
    user: Option<&str>,
    open: bool,
) -> ClientResult<()> {
    let context = config.room_context(user, page_url)?;
    let store = FileStore::new(config.store_path());
    let mut presenter =
        TerminalPresenter::stdout().with_open_browser(open || config.session.open_browser);

    let service = HttpJoinService::new(context.clone())?;
    let initiator = JoinInitiator::new(Arc::new(service));
    let outcome = initiator.join(Some(meeting), &store, &mut presenter).await;
    debug!(meeting = %meeting, outcome = %outcome, "Join finished");

    match outcome {
        JoinOutcome::WaitForModerator { .. } | JoinOutcome::Redirect { .. } => {
            store.remember_meeting(context.user(), meeting)?;
            Ok(())
        }
        JoinOutcome::Skipped => Err(ClientError::Action("no meeting name given".into())),
        other => Err(ClientError::Action(other.to_string())),
    }
}
