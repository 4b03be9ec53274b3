use crate::types::{AgentAssignment, OutgoingMessage, RemoteSession};
use async_trait::async_trait;
use careline_core::CarelineResult;

/// Remote session service reached through the support relay.
///
/// Implementations map transport failures onto the CareLine error taxonomy:
/// an unknown session is [`careline_core::CarelineError::SessionNotFound`],
/// an empty agent pool is [`careline_core::CarelineError::NoAgentAvailable`]
/// and any other handoff failure is [`careline_core::CarelineError::Handoff`].
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Fetch the current status and full transcript of a session.
    async fn get_session(&self, session_id: &str) -> CarelineResult<RemoteSession>;

    /// Whether at least one agent can take a new conversation.
    async fn check_availability(&self) -> CarelineResult<bool>;

    /// Allocate a session for `user_id` and attach an agent.
    async fn connect_to_agent(&self, user_id: &str) -> CarelineResult<AgentAssignment>;

    /// Post a message to a session.
    async fn send_message(&self, session_id: &str, message: &OutgoingMessage)
        -> CarelineResult<()>;

    /// Close a session.
    async fn end_session(&self, session_id: &str) -> CarelineResult<()>;
}
