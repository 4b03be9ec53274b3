use careline_session::DEFAULT_SNAPSHOT_TTL_DAYS;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Longest snapshot TTL honoured; larger values are clamped.
pub const MAX_SNAPSHOT_TTL_DAYS: i64 = 365;

/// Settings for the handoff controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffConfig {
    /// Interval between remote session fetches while an agent is attached.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Delay between observing a terminal status and returning to the assistant.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
    /// Age after which a stored snapshot is ignored.
    #[serde(default = "default_snapshot_ttl_days")]
    pub snapshot_ttl_days: i64,
    /// Storage key of the chat snapshot.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Opening assistant message of a fresh conversation.
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_grace_period_ms() -> u64 {
    2000
}

fn default_snapshot_ttl_days() -> i64 {
    DEFAULT_SNAPSHOT_TTL_DAYS
}

fn default_storage_key() -> String {
    "careline_chat_state".to_string()
}

fn default_greeting() -> String {
    "Hi! I'm the CareLine assistant. I can help you with our services, bookings and pricing, \
     or put you in touch with a member of our support team."
        .to_string()
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            grace_period_ms: default_grace_period_ms(),
            snapshot_ttl_days: default_snapshot_ttl_days(),
            storage_key: default_storage_key(),
            greeting: default_greeting(),
        }
    }
}

impl HandoffConfig {
    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Grace period as a [`Duration`].
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Snapshot TTL as a [`chrono::Duration`], clamped to
    /// `1..=MAX_SNAPSHOT_TTL_DAYS` days.
    pub fn snapshot_ttl(&self) -> chrono::Duration {
        let days = self.snapshot_ttl_days.clamp(1, MAX_SNAPSHOT_TTL_DAYS);
        if days != self.snapshot_ttl_days {
            warn!(
                configured = self.snapshot_ttl_days,
                used = days,
                "snapshot_ttl_days out of range"
            );
        }
        chrono::Duration::try_days(days).unwrap_or_else(chrono::Duration::zero)
    }
}
