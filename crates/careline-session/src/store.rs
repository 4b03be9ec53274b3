use crate::snapshot::{ChatSnapshot, PersistedChatState};
use crate::storage::SnapshotStorage;
use careline_core::{CarelineError, CarelineResult, Clock};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, warn};

/// Snapshots older than this many days are treated as absent.
pub const DEFAULT_SNAPSHOT_TTL_DAYS: i64 = 7;

/// Persistence port for the chat state.
///
/// Holds exactly one snapshot under `key`. Only the active controller
/// writes it; the last write wins.
pub struct ChatStateStore {
    storage: Arc<dyn SnapshotStorage>,
    clock: Arc<dyn Clock>,
    key: String,
    ttl: Duration,
}

impl ChatStateStore {
    /// Create a store over `storage` using the default 7-day TTL.
    pub fn new(
        storage: Arc<dyn SnapshotStorage>,
        clock: Arc<dyn Clock>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            clock,
            key: key.into(),
            ttl: Duration::days(DEFAULT_SNAPSHOT_TTL_DAYS),
        }
    }

    /// Override the snapshot TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The storage key this store writes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Serialize `snapshot`, stamped with the current time.
    pub async fn save(&self, snapshot: &ChatSnapshot) -> CarelineResult<()> {
        let state = PersistedChatState::from_snapshot(snapshot, self.clock.now());
        let json = serde_json::to_string(&state)?;
        self.storage.write(&self.key, &json).await?;
        debug!(
            key = %self.key,
            messages = snapshot.messages.len(),
            mode = ?state.mode,
            "Chat snapshot saved"
        );
        Ok(())
    }

    /// Load the stored snapshot.
    ///
    /// Returns `None` when nothing is stored, when the snapshot is older than
    /// the TTL, or when it is corrupt. Expired and corrupt snapshots are
    /// erased. Storage read failures are logged and also yield `None`.
    pub async fn load(&self) -> Option<ChatSnapshot> {
        let raw = match self.storage.read(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read chat snapshot");
                return None;
            }
        };

        let state = match parse(&raw) {
            Ok(state) => state,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding corrupt chat snapshot");
                self.erase().await;
                return None;
            }
        };

        let age = self.clock.now() - state.saved_at;
        if age > self.ttl {
            debug!(
                key = %self.key,
                age_hours = age.num_hours(),
                "Chat snapshot expired"
            );
            self.erase().await;
            return None;
        }

        match state.into_snapshot() {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding invalid chat snapshot");
                self.erase().await;
                None
            }
        }
    }

    /// Delete the stored snapshot. Clearing an empty store is a no-op.
    pub async fn clear(&self) -> CarelineResult<()> {
        self.storage.remove(&self.key).await?;
        debug!(key = %self.key, "Chat snapshot cleared");
        Ok(())
    }

    async fn erase(&self) {
        if let Err(e) = self.storage.remove(&self.key).await {
            warn!(key = %self.key, error = %e, "Failed to erase chat snapshot");
        }
    }
}

fn parse(raw: &str) -> CarelineResult<PersistedChatState> {
    serde_json::from_str(raw).map_err(|e| CarelineError::PersistenceCorrupt(e.to_string()))
}
