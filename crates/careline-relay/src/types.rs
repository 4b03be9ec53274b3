use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Allocated, agent not yet attached.
    Waiting,
    /// Agent attached.
    Connected,
    /// Closed by either party.
    Ended,
    /// Closed by the relay after inactivity.
    Timeout,
}

impl SessionStatus {
    /// Whether the session can still carry messages.
    pub fn is_active(self) -> bool {
        matches!(self, SessionStatus::Waiting | SessionStatus::Connected)
    }
}

/// Author of a remote message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteSender {
    /// The end-user.
    User,
    /// The human agent.
    Agent,
    /// The relay itself.
    System,
}

/// A message as recorded by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMessage {
    /// Author.
    pub sender: RemoteSender,
    /// Text content.
    pub message: String,
    /// When the relay recorded the message.
    #[serde(default = "chrono::Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Display name of the author.
    #[serde(default)]
    pub sender_name: Option<String>,
    /// Echo of the id the client attached when sending, if the relay supports it.
    #[serde(default)]
    pub client_message_id: Option<String>,
}

/// Agent attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Display name.
    pub name: String,
}

/// A relay session as returned by `getSession`.
///
/// Remote message order is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSession {
    /// Session id, when the relay includes it.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Attached agent.
    #[serde(default)]
    pub agent: Option<AgentInfo>,
    /// Full remote transcript.
    #[serde(default)]
    pub messages: Vec<RemoteMessage>,
}

impl RemoteSession {
    /// Name of the attached agent, if any.
    pub fn agent_name(&self) -> Option<&str> {
        self.agent.as_ref().map(|a| a.name.as_str())
    }
}

/// Result of a successful handoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAssignment {
    /// Newly allocated session id.
    pub session_id: String,
    /// Name of the agent who will answer.
    pub agent_name: String,
}

/// A message the client posts to a relay session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    /// Text content.
    pub message: String,
    /// Author role.
    pub role: RemoteSender,
    /// Client-generated id the relay may echo back.
    pub client_message_id: String,
}
