//! Snapshot and join collaborators.
//!
//! The core never talks to the network itself. It goes through two
//! object-safe traits:
//!
//! - [`SnapshotSource`] fetches the list of running meetings once per page
//! - [`JoinService`] asks whether a meeting can be joined right away
//!
//! With the `http` feature (default) both are implemented over `reqwest`:
//! [`HttpSnapshotSource`] and [`HttpJoinService`]. [`StaticSnapshotSource`]
//! and [`StaticJoinService`] return canned answers for tests and demos.
//!
//! ```text
//!  RoomContext::snapshot_url()        RoomContext::join_url()
//!             │                                  │
//!             ▼                                  ▼
//!   ┌──────────────────┐               ┌─────────────────┐
//!   │  SnapshotSource  │               │   JoinService   │
//!   └────────┬─────────┘               └────────┬────────┘
//!            ▼                                  ▼
//!     SnapshotResponse                     JoinDecision
//! ```

pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod join;
pub mod snapshot;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
#[cfg(feature = "http")]
pub use http::{HttpJoinService, HttpSnapshotSource};
pub use join::{JoinService, StaticJoinService};
pub use snapshot::{SnapshotSource, StaticSnapshotSource};

use std::future::Future;
use std::pin::Pin;

/// A boxed future, so the collaborator traits stay object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
