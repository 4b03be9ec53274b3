//! Persistence port for the CareLine support chat.
//!
//! A single key in a durable key-value store holds the serialized chat
//! state. Snapshots older than the configured TTL, or that fail to parse,
//! are treated as absent and erased.
//!
//! # Main types
//!
//! - [`SnapshotStorage`] — Raw key-value capability ([`FileStorage`], [`MemoryStorage`]).
//! - [`PersistedChatState`] — The on-disk JSON form.
//! - [`ChatSnapshot`] — The validated in-memory form handed to and from the controller.
//! - [`ChatStateStore`] — `save` / `load` / `clear` with TTL handling.

/// Snapshot wire format and its validated counterpart.
pub mod snapshot;
/// Key-value storage backends.
pub mod storage;
/// TTL-aware persistence port.
pub mod store;

pub use snapshot::{ChatSnapshot, PersistedChatState, PersistedMode, SavedMode};
pub use storage::{FileStorage, MemoryStorage, SnapshotStorage};
pub use store::{ChatStateStore, DEFAULT_SNAPSHOT_TTL_DAYS};
