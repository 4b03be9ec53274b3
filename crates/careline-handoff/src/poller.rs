use careline_core::ChatMessage;
use careline_relay::{RemoteSender, RemoteSession, SessionService, SessionStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// A remote message mapped into the local transcript vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// The mapped message.
    pub message: ChatMessage,
    /// Client id echoed by the relay for messages this client sent.
    pub client_message_id: Option<String>,
}

/// Why an agent session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The relay reported the session as ended.
    Closed,
    /// The relay timed the session out.
    Inactivity,
    /// The relay no longer knows the session.
    NotFound,
}

impl EndReason {
    /// Keyword identifying an equivalent terminal message already in the transcript.
    pub fn keyword(self) -> &'static str {
        match self {
            EndReason::Closed | EndReason::NotFound => "ended",
            EndReason::Inactivity => "inactivity",
        }
    }

    /// Status line shown to the user.
    pub fn message(self) -> &'static str {
        match self {
            EndReason::Closed => "The support session has ended. You're back with the assistant.",
            EndReason::Inactivity => "The support session ended due to inactivity.",
            EndReason::NotFound => "The support session is no longer available and has ended.",
        }
    }
}

/// What one poll tick observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// The session is still live.
    Update {
        /// Current status (`waiting` or `connected`).
        status: SessionStatus,
        /// Full remote transcript.
        entries: Vec<RemoteEntry>,
    },
    /// The session reached a terminal state. Polling has stopped.
    Ended {
        /// Why it ended.
        reason: EndReason,
        /// Final remote transcript, empty when the session is unknown.
        entries: Vec<RemoteEntry>,
    },
    /// The grace period after [`PollEvent::Ended`] has elapsed.
    GraceElapsed {
        /// Why the session ended.
        reason: EndReason,
    },
}

/// Map a relay transcript into local messages. Agent messages without a
/// sender name are attributed to the session's agent, then to `fallback_agent`.
pub fn map_transcript(session: &RemoteSession, fallback_agent: &str) -> Vec<RemoteEntry> {
    let agent_name = session.agent_name().unwrap_or(fallback_agent);
    session
        .messages
        .iter()
        .map(|m| {
            let message = match m.sender {
                RemoteSender::User => ChatMessage::user(&m.message, m.timestamp),
                RemoteSender::Agent => ChatMessage::agent(
                    &m.message,
                    m.sender_name.as_deref().unwrap_or(agent_name),
                    m.timestamp,
                ),
                RemoteSender::System => ChatMessage::system(&m.message, m.timestamp),
            };
            RemoteEntry {
                message,
                client_message_id: m.client_message_id.clone(),
            }
        })
        .collect()
}

/// Periodic fetch of one relay session.
///
/// The fetch loop runs on its own task and reports through a channel; the
/// owner applies events on its side. Dropping the poller aborts the task and
/// closes the channel, so nothing observed afterwards reaches the owner.
pub struct Poller {
    session_id: String,
    events: mpsc::Receiver<PollEvent>,
    task: JoinHandle<()>,
}

impl Poller {
    /// Start polling `session_id`. The first fetch happens immediately.
    pub fn start(
        service: Arc<dyn SessionService>,
        session_id: impl Into<String>,
        agent_name: impl Into<String>,
        interval: Duration,
        grace: Duration,
    ) -> Self {
        let session_id = session_id.into();
        let (tx, events) = mpsc::channel(16);
        let task = tokio::spawn(poll_loop(
            service,
            session_id.clone(),
            agent_name.into(),
            interval,
            grace,
            tx,
        ));
        debug!(session_id = %session_id, ?interval, "Session polling started");
        Self {
            session_id,
            events,
            task,
        }
    }

    /// Session being polled.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Wait for the next event. Returns `None` once the loop has finished and
    /// every event has been received. Cancel-safe.
    pub async fn next_event(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }

    /// Whether the fetch loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.task.abort();
        debug!(session_id = %self.session_id, "Session polling stopped");
    }
}

async fn poll_loop(
    service: Arc<dyn SessionService>,
    session_id: String,
    agent_name: String,
    interval: Duration,
    grace: Duration,
    tx: mpsc::Sender<PollEvent>,
) {
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let reason = loop {
        timer.tick().await;

        let event = match service.get_session(&session_id).await {
            Ok(session) => {
                let entries = map_transcript(&session, &agent_name);
                match session.status {
                    SessionStatus::Waiting | SessionStatus::Connected => PollEvent::Update {
                        status: session.status,
                        entries,
                    },
                    SessionStatus::Ended => PollEvent::Ended {
                        reason: EndReason::Closed,
                        entries,
                    },
                    SessionStatus::Timeout => PollEvent::Ended {
                        reason: EndReason::Inactivity,
                        entries,
                    },
                }
            }
            Err(e) if e.indicates_unknown_session() => PollEvent::Ended {
                reason: EndReason::NotFound,
                entries: Vec::new(),
            },
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Session poll failed, retrying next tick");
                continue;
            }
        };

        let terminal = match &event {
            PollEvent::Ended { reason, .. } => Some(*reason),
            _ => None,
        };
        if tx.send(event).await.is_err() {
            return;
        }
        if let Some(reason) = terminal {
            break reason;
        }
    };

    info!(session_id = %session_id, ?reason, "Support session ended");
    tokio::time::sleep(grace).await;
    let _ = tx.send(PollEvent::GraceElapsed { reason }).await;
}
