//! Sync error types.

use activemeetings_providers::ProviderError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by the reconciler and the session.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The snapshot was not fetched at all.
    #[error("Snapshot skipped: {0}")]
    Skipped(#[from] SnapshotSkip),

    /// Snapshot or join transport failure.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The session loop has stopped and no longer accepts commands.
    #[error("Session is closed")]
    SessionClosed,
}

impl SyncError {
    /// Returns true if the error only means there was nothing to load.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

/// Reasons for not fetching the snapshot. None of them is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SnapshotSkip {
    /// The page cannot list meetings (not a room page, or the user's home).
    #[error("not on a page to load meetings")]
    NotRoomPage,
}
