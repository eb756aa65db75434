//! Reconciliation state, join initiator and session loop.
//!
//! This crate keeps the active-meetings view of one room consistent:
//! - [`ActiveMeetings`] merges the snapshot with the presence events
//! - [`JoinInitiator`] turns a meeting pick into a join decision
//! - [`Session`] runs both on a single task, driven by [`SessionHandle`]
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use activemeetings_core::{MemoryStore, PresenceEvent, Presenter, RoomContext};
//! use activemeetings_providers::{HttpJoinService, HttpSnapshotSource};
//! use activemeetings_sync::{Session, SessionConfig};
//!
//! async fn watch<P: Presenter + Send + 'static>(presenter: P) -> Result<(), Box<dyn std::error::Error>> {
//!     let context = RoomContext::parse("u1", "https://meet.example.com/rooms/abc")?;
//!     let snapshots = Arc::new(HttpSnapshotSource::new(std::time::Duration::from_secs(10))?);
//!     let joins = Arc::new(HttpJoinService::new(context.clone())?);
//!     let session = Session::new(
//!         SessionConfig::default(),
//!         context,
//!         presenter,
//!         MemoryStore::new(),
//!         snapshots,
//!         joins,
//!     );
//!     let handle = session.handle();
//!     let task = tokio::spawn(session.run());
//!
//!     handle.subscribed().await?;
//!     handle.event(PresenceEvent::create("Room A", "u1")).await?;
//!     handle.shutdown().await?;
//!     task.await?;
//!     Ok(())
//! }
//! ```

mod error;
mod join;
mod reconcile;
mod session;
#[cfg(test)]
mod testing;

pub use error::{SnapshotSkip, SyncError, SyncResult};
pub use join::{JoinFuture, JoinInitiator, JoinOutcome, PendingJoin};
pub use reconcile::{
    ActiveMeetings, DEFAULT_BUFFER_LIMIT, DropReason, EventOutcome, IgnoreReason, ReconcileStats,
    SnapshotReport,
};
pub use session::{
    Session, SessionCommand, SessionConfig, SessionHandle, SessionPhase, SessionStatus,
    SharedSessionStatus,
};
