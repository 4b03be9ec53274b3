use careline_core::QuickAction;

/// Destinations a quick-action can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Service catalogue.
    Services,
    /// Booking flow.
    BookService,
    /// Contact details.
    Contact,
    /// Support ticket form.
    TicketForm,
    /// Price list.
    Pricing,
    /// Login screen.
    Login,
}

impl Route {
    /// Path of the route in the host application.
    pub fn path(self) -> &'static str {
        match self {
            Route::Services => "/services",
            Route::BookService => "/book",
            Route::Contact => "/contact",
            Route::TicketForm => "/support/ticket",
            Route::Pricing => "/pricing",
            Route::Login => "/login",
        }
    }

    /// The route an action navigates to, or `None` for actions handled in place.
    pub fn for_action(action: QuickAction) -> Option<Route> {
        match action {
            QuickAction::ViewServices => Some(Route::Services),
            QuickAction::BookService => Some(Route::BookService),
            QuickAction::ViewContact => Some(Route::Contact),
            QuickAction::CreateTicket | QuickAction::GoToTicketForm => Some(Route::TicketForm),
            QuickAction::ViewPricing => Some(Route::Pricing),
            QuickAction::Login => Some(Route::Login),
            QuickAction::WaitAgent | QuickAction::RetryAgent | QuickAction::Continue => None,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// What dispatching a quick-action produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The host should navigate to this route.
    Navigate(Route),
    /// The controller handled the action itself.
    Handled,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_every_action_has_exactly_one_outcome() {
        let in_place: Vec<QuickAction> = QuickAction::ALL
            .into_iter()
            .filter(|a| Route::for_action(*a).is_none())
            .collect();
        assert_eq!(
            in_place,
            vec![QuickAction::WaitAgent, QuickAction::RetryAgent, QuickAction::Continue]
        );
    }

    #[test]
    fn test_ticket_actions_share_the_form() {
        assert_eq!(Route::for_action(QuickAction::CreateTicket), Some(Route::TicketForm));
        assert_eq!(Route::for_action(QuickAction::GoToTicketForm), Some(Route::TicketForm));
        assert_eq!(Route::TicketForm.to_string(), "/support/ticket");
    }
}
