use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The closed set of commands a quick-action button can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickAction {
    /// Open the service catalogue.
    ViewServices,
    /// Start a booking.
    BookService,
    /// Show contact details.
    ViewContact,
    /// Open a support ticket.
    CreateTicket,
    /// Jump straight to the ticket form.
    GoToTicketForm,
    /// Keep waiting for an agent (re-runs the handoff).
    WaitAgent,
    /// Retry a failed handoff.
    RetryAgent,
    /// Show pricing.
    ViewPricing,
    /// Go to the login screen.
    Login,
    /// Stay with the automated assistant.
    Continue,
}

impl QuickAction {
    /// Every action, in wire order.
    pub const ALL: [QuickAction; 10] = [
        QuickAction::ViewServices,
        QuickAction::BookService,
        QuickAction::ViewContact,
        QuickAction::CreateTicket,
        QuickAction::GoToTicketForm,
        QuickAction::WaitAgent,
        QuickAction::RetryAgent,
        QuickAction::ViewPricing,
        QuickAction::Login,
        QuickAction::Continue,
    ];

    /// The wire name of the action.
    pub fn as_str(self) -> &'static str {
        match self {
            QuickAction::ViewServices => "view_services",
            QuickAction::BookService => "book_service",
            QuickAction::ViewContact => "view_contact",
            QuickAction::CreateTicket => "create_ticket",
            QuickAction::GoToTicketForm => "go_to_ticket_form",
            QuickAction::WaitAgent => "wait_agent",
            QuickAction::RetryAgent => "retry_agent",
            QuickAction::ViewPricing => "view_pricing",
            QuickAction::Login => "login",
            QuickAction::Continue => "continue",
        }
    }
}

impl std::fmt::Display for QuickAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuickAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuickAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown quick action '{s}'"))
    }
}

/// A labeled quick-action attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpOption {
    /// Button label.
    pub label: String,
    /// Command dispatched when the button is chosen.
    pub action: QuickAction,
}

impl FollowUpOption {
    /// Creates an option.
    pub fn new(label: impl Into<String>, action: QuickAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }

    /// Offered when an unauthenticated caller asks for a human.
    pub fn login_required() -> Vec<Self> {
        vec![
            Self::new("Log in", QuickAction::Login),
            Self::new("Continue with assistant", QuickAction::Continue),
        ]
    }

    /// Offered when the availability check reports nobody online.
    pub fn no_agent_available() -> Vec<Self> {
        vec![
            Self::new("Wait for an agent", QuickAction::WaitAgent),
            Self::new("Create a support ticket", QuickAction::CreateTicket),
            Self::new("Continue with assistant", QuickAction::Continue),
        ]
    }

    /// Offered when the handoff call itself failed.
    pub fn handoff_failed() -> Vec<Self> {
        vec![
            Self::new("Create a support ticket", QuickAction::CreateTicket),
            Self::new("Try again", QuickAction::RetryAgent),
            Self::new("Continue with assistant", QuickAction::Continue),
        ]
    }
}
