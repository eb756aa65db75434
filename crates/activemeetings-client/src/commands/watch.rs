//! Following a room.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use activemeetings_core::MembershipStore;
use activemeetings_protocol::{EventMessage, LineReader, ProtocolError};
use activemeetings_providers::{HttpJoinService, HttpSnapshotSource};
use activemeetings_sync::{Session, SessionHandle, SessionPhase};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::store::FileStore;
use crate::terminal::TerminalPresenter;

/// Options of the `watch` command.
#[derive(Debug, Default)]
pub struct WatchOptions<'a> {
    pub page_url: Option<&'a str>,
    pub user: Option<&'a str>,
    pub events: Option<&'a Path>,
    pub open: bool,
    pub print_status: bool,
}

/// Loads the active meetings, then applies events until the stream ends or
/// the user interrupts.
pub async fn watch(config: &ClientConfig, options: WatchOptions<'_>) -> ClientResult<()> {
    let context = config.room_context(options.user, options.page_url)?;
    let store = FileStore::new(config.store_path());
    let previous: Vec<String> = store
        .previously_joined(context.user())
        .iter()
        .map(str::to_string)
        .collect();
    let presenter = TerminalPresenter::stdout()
        .with_open_browser(options.open || config.session.open_browser)
        .with_previous(previous);

    let snapshots = Arc::new(HttpSnapshotSource::new(config.http_timeout())?);
    let joins = Arc::new(HttpJoinService::new(context.clone())?);
    let session = Session::new(
        config.session_config(),
        context,
        presenter,
        store,
        snapshots,
        joins,
    );
    let handle = session.handle();
    let task = tokio::spawn(session.run());

    let fed = match options.events {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            feed(BufReader::new(file), &handle).await
        }
        None => feed(BufReader::new(tokio::io::stdin()), &handle).await,
    };

    settle(&handle, config.http_timeout() + Duration::from_secs(1)).await;
    // Already closed if the session stopped on its own
    let _ = handle.shutdown().await;
    let state = task
        .await
        .map_err(|e| ClientError::Session(format!("session task failed: {}", e)))?;
    for presence in state.registry().iter() {
        debug!(
            meeting = %presence.name,
            participants = presence.participant_count,
            moderators = presence.moderator_count,
            "Meeting still active"
        );
    }
    debug!(meetings = state.registry().len(), "Session finished");

    if options.print_status {
        let status = handle.status().await;
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| ClientError::Session(format!("failed to serialize status: {}", e)))?;
        println!("{}", json);
    }

    fed
}

/// Forwards every event of `reader` to the session.
async fn feed<R: AsyncBufRead + Unpin>(reader: R, handle: &SessionHandle) -> ClientResult<()> {
    let mut reader = LineReader::new(reader);
    // The stream is open, so the subscription is established
    handle.subscribed().await?;

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        let message = tokio::select! {
            message = reader.read_message::<EventMessage>() => message,
            _ = &mut interrupt => {
                info!("Interrupted");
                return Ok(());
            }
        };

        match message {
            Ok(Some(message)) => handle.event(message.into()).await?,
            Ok(None) => {
                debug!("Event stream ended");
                return Ok(());
            }
            // The reader has consumed the bad line, so only a broken stream stops the feed
            Err(ProtocolError::Io(err)) => return Err(err.into()),
            Err(err) => warn!(error = %err, "Skipping malformed event"),
        }
    }
}

/// Waits for the snapshot step to finish, so a short event file does not
/// shut the session down before the snapshot lands.
async fn settle(handle: &SessionHandle, limit: Duration) {
    let waiting = async {
        while !handle.is_closed()
            && matches!(
                handle.status().await.phase,
                SessionPhase::Subscribing | SessionPhase::Loading
            )
        {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    };

    if tokio::time::timeout(limit, waiting).await.is_err() {
        warn!("Snapshot still loading, stopping anyway");
    }
}
