//! Core types: presence, registry, membership, room context, presentation boundary

pub mod format;
pub mod membership;
pub mod presence;
pub mod present;
pub mod registry;
pub mod room;
pub mod rows;
pub mod tracing;

pub use format::{counts_text, pluralize, row_text};
pub use membership::{
    joined_rooms_key, MembershipStore, MemoryStore, PreviouslyJoined, JOINED_ROOMS_PREFIX,
    LAST_JOINED_NAME_KEY,
};
pub use presence::{MeetingPresence, PresenceEvent, PresenceKind, Role};
pub use present::Presenter;
pub use registry::{
    CountPolicy, MeetingRegistry, PresenceDelta, RegistryChange, RegistryError, RegistryResult,
};
pub use room::{RoomContext, JOIN_SUFFIX, SNAPSHOT_SUFFIX};
pub use rows::{RowHandle, RowTable};
pub use self::tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
