use crate::actions::{ActionOutcome, Route};
use crate::config::HandoffConfig;
use crate::gate::{AvailabilityGate, HandoffRefusal};
use crate::mode::ChatMode;
use crate::poller::{map_transcript, EndReason, PollEvent, Poller};
use crate::reconciler::Reconciler;
use careline_core::{ChatMessage, Clock, FollowUpOption, Notice, QuickAction};
use careline_relay::{
    AgentAssignment, BotResponder, OutgoingMessage, RemoteSender, SessionService,
};
use careline_session::{ChatSnapshot, ChatStateStore, SavedMode};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

const BOT_UNAVAILABLE: &str =
    "Sorry, I couldn't process that right now. Please try again in a moment.";
const CONTINUE_WITH_BOT: &str = "No problem, I'm still here. What else can I help you with?";
const LOGIN_TO_RESUME: &str =
    "Your conversation with a support agent was interrupted. Please log in to continue.";
const PREVIOUS_SESSION_ENDED: &str =
    "Your previous support session has ended. You're chatting with the assistant again.";

/// Single owner of the support conversation.
///
/// All mutation goes through `&mut self`, so transitions never interleave.
/// While an agent is attached a [`Poller`] feeds remote snapshots back in
/// through [`ChatController::next_poll_event`] and
/// [`ChatController::apply_poll_event`]; outside that state no poller exists.
/// Every validated transcript or mode change is persisted.
pub struct ChatController {
    config: HandoffConfig,
    sessions: Arc<dyn SessionService>,
    bot: Arc<dyn BotResponder>,
    gate: AvailabilityGate,
    store: ChatStateStore,
    clock: Arc<dyn Clock>,
    user_id: Option<String>,
    conversation_id: Uuid,
    next_seq: u64,
    mode: ChatMode,
    transcript: Reconciler,
    poller: Option<Poller>,
    /// Set once the relay reports the live session over, until the grace
    /// period hands control back to the assistant.
    remote_end: Option<EndReason>,
    notices: Vec<Notice>,
}

impl ChatController {
    /// Load persisted state (or greet) and resume an agent session if one
    /// was active.
    pub async fn mount(
        config: HandoffConfig,
        sessions: Arc<dyn SessionService>,
        bot: Arc<dyn BotResponder>,
        store: ChatStateStore,
        clock: Arc<dyn Clock>,
        user_id: Option<String>,
    ) -> Self {
        let opening = greeting(&config, clock.as_ref());
        let mut controller = Self {
            gate: AvailabilityGate::new(sessions.clone()),
            config,
            sessions,
            bot,
            store,
            clock,
            user_id,
            conversation_id: Uuid::new_v4(),
            next_seq: 0,
            mode: ChatMode::Bot,
            transcript: Reconciler::new(vec![opening]),
            poller: None,
            remote_end: None,
            notices: Vec::new(),
        };

        match controller.store.load().await {
            Some(snapshot) => controller.restore(snapshot).await,
            None => debug!("No stored conversation, starting fresh"),
        }
        controller
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    /// Current mode.
    pub fn mode(&self) -> &ChatMode {
        &self.mode
    }

    /// The visible transcript.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.transcript.visible()
    }

    /// Length of the visible transcript.
    pub fn message_count(&self) -> usize {
        self.transcript.len()
    }

    /// The frozen assistant-era history.
    pub fn bot_baseline(&self) -> &[ChatMessage] {
        self.transcript.baseline()
    }

    /// Whether a poller is running.
    pub fn is_polling(&self) -> bool {
        self.poller.is_some()
    }

    /// The authenticated user, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Set or clear the authenticated identity.
    pub fn set_user(&mut self, user_id: Option<String>) {
        debug!(authenticated = user_id.is_some(), "Identity changed");
        self.user_id = user_id;
    }

    /// Take the notifications raised since the last call.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ── User operations ─────────────────────────────────────────────────────

    /// Send a user message to whoever is answering. Blank input is ignored.
    pub async fn send_message(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if let Some(session_id) = self.mode.session_id().map(str::to_string) {
            self.send_to_agent(&session_id, text).await;
        } else if self.mode == ChatMode::Bot {
            self.ask_bot(text).await;
        } else {
            debug!(mode = %self.mode, "Message dropped during transition");
        }
    }

    /// Ask for a human agent.
    pub async fn request_agent(&mut self) {
        if self.mode != ChatMode::Bot {
            debug!(mode = %self.mode, "Agent requested outside assistant mode");
            if let Some(agent) = self.mode.agent_name() {
                self.notices
                    .push(Notice::info(format!("You're already chatting with {agent}")));
            }
            return;
        }

        self.mode = ChatMode::Connecting;
        info!("Requesting a support agent");
        let result = self.gate.request_handoff(self.user_id.as_deref()).await;
        match result {
            Ok(assignment) => self.enter_agent(assignment).await,
            Err(e) => {
                self.mode = ChatMode::Bot;
                let refusal = HandoffRefusal::from_error(&e);
                debug!(error = %e, "Handoff refused");
                let message = ChatMessage::system(refusal.message, self.clock.now())
                    .with_options(refusal.options);
                self.transcript.push_local(message);
                self.notices.push(refusal.notice);
                self.persist().await;
            }
        }
    }

    /// End the agent session and return to the assistant. A no-op outside
    /// agent mode, so repeated calls end the remote session once.
    pub async fn end_session(&mut self) {
        let (session_id, agent_name) = match &self.mode {
            ChatMode::Agent {
                session_id,
                agent_name,
            } => (session_id.clone(), agent_name.clone()),
            _ => {
                debug!(mode = %self.mode, "No agent session to end");
                return;
            }
        };
        self.mode = ChatMode::Ending;
        self.stop_polling();

        if let Some(reason) = self.remote_end {
            debug!(
                session_id = %session_id,
                ?reason,
                "Session already over, skipping grace period"
            );
            self.leave_agent().await;
            return;
        }

        if let Err(e) = self.sessions.end_session(&session_id).await {
            warn!(session_id = %session_id, error = %e, "Failed to end support session");
            self.notices.push(Notice::warning(
                "We couldn't reach the support desk; the session will close on its own.",
            ));
        }
        info!(session_id = %session_id, "Support session ended by user");

        let note = ChatMessage::system(
            format!("You ended the chat with {agent_name}. You're back with the assistant."),
            self.clock.now(),
        );
        self.transcript.push_local(note);
        self.leave_agent().await;
    }

    /// Dispatch a quick-action.
    pub async fn dispatch_action(&mut self, action: QuickAction) -> ActionOutcome {
        debug!(%action, "Quick action");
        match action {
            QuickAction::WaitAgent | QuickAction::RetryAgent => {
                self.request_agent().await;
                ActionOutcome::Handled
            }
            QuickAction::Continue => {
                let message = ChatMessage::bot(CONTINUE_WITH_BOT, self.clock.now())
                    .with_options(default_options());
                self.transcript.push_local(message);
                self.persist().await;
                ActionOutcome::Handled
            }
            other => match Route::for_action(other) {
                Some(route) => ActionOutcome::Navigate(route),
                None => ActionOutcome::Handled,
            },
        }
    }

    /// Forget the conversation: end any agent session, delete the snapshot
    /// and start over with the greeting.
    pub async fn clear_history(&mut self) {
        if self.mode.is_agent() {
            self.end_session().await;
        }
        self.stop_polling();
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "Failed to delete chat snapshot");
        }
        self.transcript = Reconciler::new(vec![greeting(&self.config, self.clock.as_ref())]);
        self.mode = ChatMode::Bot;
        info!("Conversation cleared");
    }

    /// Stop background work. The stored snapshot is kept, so a later
    /// [`ChatController::mount`] resumes where this one left off.
    pub fn shutdown(mut self) {
        self.stop_polling();
        info!(mode = %self.mode, "Chat controller shut down");
    }

    // ── Polling ─────────────────────────────────────────────────────────────

    /// Wait for the next event from the poller. Pending forever while no
    /// agent is attached. Cancel-safe, for use in `tokio::select!`.
    pub async fn next_poll_event(&mut self) -> PollEvent {
        loop {
            let Some(poller) = self.poller.as_mut() else {
                return std::future::pending().await;
            };
            if let Some(event) = poller.next_event().await {
                return event;
            }
            // The loop exited without a terminal event; keep the agent
            // session observed.
            warn!("Session poller stopped unexpectedly, restarting");
            self.poller = None;
            self.start_polling();
            if self.poller.is_none() {
                return std::future::pending().await;
            }
        }
    }

    /// Apply one poller event. Returns whether the transcript or mode changed.
    pub async fn apply_poll_event(&mut self, event: PollEvent) -> bool {
        if !self.mode.is_agent() {
            debug!(mode = %self.mode, "Poll event ignored");
            return false;
        }
        match event {
            PollEvent::Update { entries, .. } => {
                let changed = self.transcript.apply_remote(entries);
                if changed {
                    self.persist().await;
                }
                changed
            }
            PollEvent::Ended { reason, entries } => {
                self.remote_end = Some(reason);
                let mut changed = self.transcript.apply_remote(entries);
                if !self.transcript.has_agent_system_message(reason.keyword()) {
                    self.transcript
                        .push_local(ChatMessage::system(reason.message(), self.clock.now()));
                    changed = true;
                }
                self.notices.push(Notice::info("The support session has ended"));
                if changed {
                    self.persist().await;
                }
                changed
            }
            PollEvent::GraceElapsed { reason } => {
                debug!(?reason, "Grace period elapsed");
                self.leave_agent().await;
                true
            }
        }
    }

    // ── Internals ───────────────────────────────────────────────────────────

    async fn ask_bot(&mut self, text: &str) {
        self.transcript
            .push_local(ChatMessage::user(text, self.clock.now()));
        self.persist().await;

        let reply = match self.bot.get_response(text).await {
            Ok(reply) => ChatMessage::bot(reply.response, self.clock.now())
                .with_options(reply.follow_up_options),
            Err(e) => {
                warn!(error = %e, "Assistant request failed");
                self.notices
                    .push(Notice::error("The assistant is unavailable right now"));
                ChatMessage::system(BOT_UNAVAILABLE, self.clock.now())
            }
        };
        self.transcript.push_local(reply);
        self.persist().await;
    }

    async fn send_to_agent(&mut self, session_id: &str, text: &str) {
        let client_message_id = format!("{}-{}", self.conversation_id, self.next_seq);
        self.next_seq += 1;

        self.transcript.push_pending(
            client_message_id.clone(),
            ChatMessage::user(text, self.clock.now()),
        );
        self.persist().await;

        let outgoing = OutgoingMessage {
            message: text.to_string(),
            role: RemoteSender::User,
            client_message_id,
        };
        if let Err(e) = self.sessions.send_message(session_id, &outgoing).await {
            warn!(session_id = %session_id, error = %e, "Failed to deliver message to agent");
            self.notices
                .push(Notice::warning("Your message may not have reached the agent."));
        }
    }

    async fn enter_agent(&mut self, assignment: AgentAssignment) {
        let AgentAssignment {
            session_id,
            agent_name,
        } = assignment;
        let announcement = ChatMessage::system(
            format!("Connected to {agent_name}. They'll be with you in a moment."),
            self.clock.now(),
        );
        self.transcript.begin_agent(announcement);
        self.notices
            .push(Notice::info(format!("You're now chatting with {agent_name}")));
        self.mode = ChatMode::Agent {
            session_id,
            agent_name,
        };
        self.start_polling();
        self.persist().await;
    }

    /// Agent to assistant: everything observed joins the baseline.
    async fn leave_agent(&mut self) {
        self.stop_polling();
        self.remote_end = None;
        self.transcript.end_agent();
        self.mode = ChatMode::Bot;
        self.persist().await;
    }

    async fn restore(&mut self, snapshot: ChatSnapshot) {
        let ChatSnapshot {
            messages,
            bot_baseline,
            mode,
        } = snapshot;

        match mode {
            SavedMode::Bot => {
                self.transcript = Reconciler::from_bot(bot_baseline, messages);
                debug!(messages = self.transcript.len(), "Conversation restored");
            }
            SavedMode::Connecting => {
                info!("Stored handoff was interrupted, resuming with the assistant");
                self.transcript = Reconciler::from_bot(bot_baseline, messages);
            }
            SavedMode::Agent {
                session_id,
                agent_name,
            } => {
                self.resume_agent(bot_baseline, messages, session_id, agent_name)
                    .await;
            }
        }
    }

    async fn resume_agent(
        &mut self,
        bot_baseline: Vec<ChatMessage>,
        messages: Vec<ChatMessage>,
        session_id: String,
        agent_name: String,
    ) {
        if self.user_id.is_none() {
            info!(session_id = %session_id, "Stored agent session needs a login to resume");
            self.transcript = Reconciler::from_bot(bot_baseline, messages);
            self.transcript.push_local(
                ChatMessage::system(LOGIN_TO_RESUME, self.clock.now())
                    .with_options(FollowUpOption::login_required()),
            );
            self.transcript.end_agent();
            self.persist().await;
            return;
        }

        match self.sessions.get_session(&session_id).await {
            Ok(remote) if remote.status.is_active() => {
                self.transcript = Reconciler::resume_agent(
                    bot_baseline,
                    messages,
                    map_transcript(&remote, &agent_name),
                );
                self.transcript.push_local(ChatMessage::system(
                    format!("Your conversation with {agent_name} has been restored."),
                    self.clock.now(),
                ));
                info!(session_id = %session_id, "Agent session resumed");
                self.mode = ChatMode::Agent {
                    session_id,
                    agent_name,
                };
                self.start_polling();
                self.persist().await;
            }
            probe => {
                match probe {
                    Ok(remote) => {
                        info!(
                            session_id = %session_id,
                            status = ?remote.status,
                            "Stored agent session is over"
                        );
                    }
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "Could not resume agent session");
                    }
                }
                self.transcript = Reconciler::from_bot(bot_baseline, messages);
                self.transcript
                    .push_local(ChatMessage::system(PREVIOUS_SESSION_ENDED, self.clock.now()));
                self.transcript.end_agent();
                self.persist().await;
            }
        }
    }

    fn start_polling(&mut self) {
        self.stop_polling();
        if let ChatMode::Agent {
            session_id,
            agent_name,
        } = &self.mode
        {
            self.poller = Some(Poller::start(
                self.sessions.clone(),
                session_id.clone(),
                agent_name.clone(),
                self.config.poll_interval(),
                self.config.grace_period(),
            ));
        }
    }

    fn stop_polling(&mut self) {
        self.poller = None;
    }

    async fn persist(&self) {
        let Some(mode) = self.mode.saved() else {
            return;
        };
        let snapshot = ChatSnapshot {
            messages: self.transcript.visible(),
            bot_baseline: self.transcript.baseline().to_vec(),
            mode,
        };
        if let Err(e) = self.store.save(&snapshot).await {
            warn!(error = %e, "Failed to persist conversation");
        }
    }
}

fn default_options() -> Vec<FollowUpOption> {
    vec![
        FollowUpOption::new("Browse services", QuickAction::ViewServices),
        FollowUpOption::new("Book an appointment", QuickAction::BookService),
        FollowUpOption::new("See pricing", QuickAction::ViewPricing),
    ]
}

fn greeting(config: &HandoffConfig, clock: &dyn Clock) -> ChatMessage {
    ChatMessage::bot(config.greeting.clone(), clock.now()).with_options(default_options())
}
