use careline_session::SavedMode;

/// Who the user is currently talking to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChatMode {
    /// The automated assistant answers.
    #[default]
    Bot,
    /// A handoff request is in flight.
    Connecting,
    /// A human agent is attached to a relay session.
    Agent {
        /// Relay session id.
        session_id: String,
        /// Display name of the agent.
        agent_name: String,
    },
    /// The session is being closed; no further mutation from the poller.
    Ending,
}

impl ChatMode {
    /// Whether an agent is attached.
    pub fn is_agent(&self) -> bool {
        matches!(self, ChatMode::Agent { .. })
    }

    /// Relay session id while an agent is attached.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            ChatMode::Agent { session_id, .. } => Some(session_id),
            _ => None,
        }
    }

    /// Agent display name while an agent is attached.
    pub fn agent_name(&self) -> Option<&str> {
        match self {
            ChatMode::Agent { agent_name, .. } => Some(agent_name),
            _ => None,
        }
    }

    /// The persisted form of this mode. `Ending` is transient and never stored.
    pub fn saved(&self) -> Option<SavedMode> {
        match self {
            ChatMode::Bot => Some(SavedMode::Bot),
            ChatMode::Connecting => Some(SavedMode::Connecting),
            ChatMode::Agent {
                session_id,
                agent_name,
            } => Some(SavedMode::Agent {
                session_id: session_id.clone(),
                agent_name: agent_name.clone(),
            }),
            ChatMode::Ending => None,
        }
    }
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatMode::Bot => write!(f, "assistant"),
            ChatMode::Connecting => write!(f, "connecting"),
            ChatMode::Agent { agent_name, .. } => write!(f, "agent ({agent_name})"),
            ChatMode::Ending => write!(f, "ending"),
        }
    }
}
