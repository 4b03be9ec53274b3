use careline_core::{CarelineError, CarelineResult, FollowUpOption, Notice};
use careline_relay::{AgentAssignment, SessionService};
use std::sync::Arc;
use tracing::{info, warn};

/// Decides whether a handoff may proceed and performs it.
///
/// Checks, in order: an authenticated identity (no network call without
/// one), agent availability, then the handoff call itself.
pub struct AvailabilityGate {
    sessions: Arc<dyn SessionService>,
}

impl AvailabilityGate {
    /// Create a gate over the relay.
    pub fn new(sessions: Arc<dyn SessionService>) -> Self {
        Self { sessions }
    }

    /// Run the gate for `user_id`.
    ///
    /// Errors are one of [`CarelineError::Unauthenticated`],
    /// [`CarelineError::NoAgentAvailable`] or [`CarelineError::Handoff`].
    pub async fn request_handoff(&self, user_id: Option<&str>) -> CarelineResult<AgentAssignment> {
        let user_id = user_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(CarelineError::Unauthenticated)?;

        let available = self.sessions.check_availability().await.map_err(|e| {
            warn!(error = %e, "Availability check failed");
            CarelineError::Handoff(format!("Availability check failed: {e}"))
        })?;
        if !available {
            info!("No support agent available");
            return Err(CarelineError::NoAgentAvailable);
        }

        match self.sessions.connect_to_agent(user_id).await {
            Ok(assignment) => {
                info!(
                    session_id = %assignment.session_id,
                    agent = %assignment.agent_name,
                    "Agent assigned"
                );
                Ok(assignment)
            }
            Err(CarelineError::NoAgentAvailable) => Err(CarelineError::NoAgentAvailable),
            Err(CarelineError::Handoff(msg)) => {
                warn!(error = %msg, "Handoff failed");
                Err(CarelineError::Handoff(msg))
            }
            Err(e) => {
                warn!(error = %e, "Handoff failed");
                Err(CarelineError::Handoff(e.to_string()))
            }
        }
    }
}

/// What to show the user when a handoff does not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffRefusal {
    /// System message appended to the transcript.
    pub message: String,
    /// Quick-actions offered with it.
    pub options: Vec<FollowUpOption>,
    /// Transient notification.
    pub notice: Notice,
}

impl HandoffRefusal {
    /// The refusal matching a gate error.
    pub fn from_error(err: &CarelineError) -> Self {
        match err {
            CarelineError::Unauthenticated => Self {
                message: "Please log in to chat with a member of our support team.".to_string(),
                options: FollowUpOption::login_required(),
                notice: Notice::warning("Log in to talk to a support agent"),
            },
            CarelineError::NoAgentAvailable => Self {
                message: "All of our support agents are busy right now. You can wait for the \
                          next available agent or leave us a ticket."
                    .to_string(),
                options: FollowUpOption::no_agent_available(),
                notice: Notice::info("No agent is available at the moment"),
            },
            _ => Self {
                message: "We couldn't connect you to a support agent. Please try again or \
                          create a support ticket."
                    .to_string(),
                options: FollowUpOption::handoff_failed(),
                notice: Notice::error("Connecting to an agent failed"),
            },
        }
    }
}
