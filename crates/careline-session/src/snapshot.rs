use careline_core::{CarelineError, CarelineResult, ChatMessage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mode tag as written to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistedMode {
    /// Chatting with the automated assistant.
    Bot,
    /// A handoff was in flight.
    Connecting,
    /// Chatting with a human agent.
    Agent,
}

/// On-disk form of the chat state.
///
/// `session_id` and `agent_name` are only present for [`PersistedMode::Agent`];
/// [`PersistedChatState::into_snapshot`] rejects any other combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedChatState {
    /// The visible transcript at save time.
    pub messages: Vec<ChatMessage>,
    /// Transcript accumulated in bot mode up to the most recent handoff.
    pub bot_baseline: Vec<ChatMessage>,
    /// Mode at save time.
    pub mode: PersistedMode,
    /// Remote session id (agent mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Name of the assigned agent (agent mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    /// When the snapshot was written.
    pub saved_at: DateTime<Utc>,
}

/// Mode of a validated snapshot. Illegal field combinations cannot be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavedMode {
    /// Chatting with the automated assistant.
    Bot,
    /// A handoff was in flight when the snapshot was written.
    Connecting,
    /// Chatting with a human agent.
    Agent {
        /// Remote session id.
        session_id: String,
        /// Name of the assigned agent.
        agent_name: String,
    },
}

/// Validated chat state exchanged with the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSnapshot {
    /// The visible transcript.
    pub messages: Vec<ChatMessage>,
    /// Transcript accumulated in bot mode up to the most recent handoff.
    pub bot_baseline: Vec<ChatMessage>,
    /// Conversation mode.
    pub mode: SavedMode,
}

impl PersistedChatState {
    /// Stamp a snapshot for writing.
    pub fn from_snapshot(snapshot: &ChatSnapshot, saved_at: DateTime<Utc>) -> Self {
        let (mode, session_id, agent_name) = match &snapshot.mode {
            SavedMode::Bot => (PersistedMode::Bot, None, None),
            SavedMode::Connecting => (PersistedMode::Connecting, None, None),
            SavedMode::Agent {
                session_id,
                agent_name,
            } => (
                PersistedMode::Agent,
                Some(session_id.clone()),
                Some(agent_name.clone()),
            ),
        };
        Self {
            messages: snapshot.messages.clone(),
            bot_baseline: snapshot.bot_baseline.clone(),
            mode,
            session_id,
            agent_name,
            saved_at,
        }
    }

    /// Validate the mode/session invariant and drop the stamp.
    pub fn into_snapshot(self) -> CarelineResult<ChatSnapshot> {
        let mode = match (self.mode, self.session_id, self.agent_name) {
            (PersistedMode::Bot, None, None) => SavedMode::Bot,
            (PersistedMode::Connecting, None, None) => SavedMode::Connecting,
            (PersistedMode::Agent, Some(session_id), Some(agent_name))
                if !session_id.is_empty() =>
            {
                SavedMode::Agent {
                    session_id,
                    agent_name,
                }
            }
            (mode, session_id, agent_name) => {
                return Err(CarelineError::PersistenceCorrupt(format!(
                    "mode {mode:?} with session_id={session_id:?} agent_name={agent_name:?}"
                )));
            }
        };
        if self.bot_baseline.len() > self.messages.len() {
            return Err(CarelineError::PersistenceCorrupt(format!(
                "baseline has {} messages but transcript only {}",
                self.bot_baseline.len(),
                self.messages.len()
            )));
        }
        Ok(ChatSnapshot {
            messages: self.messages,
            bot_baseline: self.bot_baseline,
            mode,
        })
    }
}
