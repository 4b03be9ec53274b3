use crate::poller::RemoteEntry;
use careline_core::{ChatMessage, MessageKind};
use tracing::debug;

/// Builds the single visible transcript out of the frozen assistant history
/// and the live agent conversation.
///
/// While the assistant answers, the visible transcript is the baseline
/// followed by locally appended messages. While an agent is attached it is
/// the baseline, then the remote transcript (authoritative order) with local
/// status lines anchored at the remote position they were added at, then
/// outgoing messages the relay has not echoed yet.
///
/// Remote snapshots never shrink the view: a snapshot shorter than what was
/// already observed is stale and ignored, and every newly observed remote
/// message retires at most one pending send.
#[derive(Debug, Clone)]
pub struct Reconciler {
    baseline: Vec<ChatMessage>,
    segment: Segment,
}

#[derive(Debug, Clone)]
enum Segment {
    Bot(Vec<ChatMessage>),
    Agent(AgentSegment),
}

#[derive(Debug, Clone, Default)]
struct AgentSegment {
    remote: Vec<ChatMessage>,
    /// Local status lines, each anchored after `anchor` remote messages.
    notes: Vec<(usize, ChatMessage)>,
    pending: Vec<PendingSend>,
}

#[derive(Debug, Clone)]
struct PendingSend {
    /// `None` for sends restored from a snapshot, matched by text only.
    client_id: Option<String>,
    /// Remote length when the message was sent; its echo cannot come earlier.
    anchor: usize,
    message: ChatMessage,
}

impl PendingSend {
    fn is_echoed_by(&self, entry: &RemoteEntry, index: usize) -> bool {
        if entry.message.kind != MessageKind::User {
            return false;
        }
        match (&self.client_id, &entry.client_message_id) {
            (Some(mine), Some(theirs)) => mine == theirs,
            _ => index >= self.anchor && entry.message.text.trim() == self.message.text.trim(),
        }
    }
}

impl Reconciler {
    /// A fresh assistant conversation starting with `opening`.
    pub fn new(opening: Vec<ChatMessage>) -> Self {
        Self::from_bot(Vec::new(), opening)
    }

    /// Rebuild an assistant conversation from persisted state.
    ///
    /// `messages` is the full visible transcript; its first
    /// `baseline.len()` entries are the baseline.
    pub fn from_bot(baseline: Vec<ChatMessage>, mut messages: Vec<ChatMessage>) -> Self {
        let tail = if messages.len() >= baseline.len() {
            messages.split_off(baseline.len())
        } else {
            Vec::new()
        };
        Self {
            baseline,
            segment: Segment::Bot(tail),
        }
    }

    /// Re-enter an agent conversation from persisted state and a fresh
    /// remote transcript.
    ///
    /// `messages` is the full visible transcript saved while the agent was
    /// attached. Its agent-era part is matched in order against `entries`;
    /// matched messages are remote, unmatched user messages become pending
    /// sends (retired by text once the relay records them) and everything
    /// else is kept as a local line anchored where it was. Nothing saved is
    /// dropped.
    pub fn resume_agent(
        baseline: Vec<ChatMessage>,
        mut messages: Vec<ChatMessage>,
        entries: Vec<RemoteEntry>,
    ) -> Self {
        let saved = if messages.len() >= baseline.len() {
            messages.split_off(baseline.len())
        } else {
            Vec::new()
        };

        let mut agent = AgentSegment::default();
        for message in saved {
            let anchor = agent.remote.len();
            let observed = entries.get(anchor).filter(|entry| {
                entry.message.kind == message.kind
                    && entry.message.text.trim() == message.text.trim()
            });
            if let Some(entry) = observed {
                agent.remote.push(entry.message.clone());
            } else if message.kind == MessageKind::User {
                agent.pending.push(PendingSend {
                    client_id: None,
                    anchor,
                    message,
                });
            } else {
                agent.notes.push((anchor, message));
            }
        }

        let mut reconciler = Self {
            baseline,
            segment: Segment::Agent(agent),
        };
        reconciler.apply_remote(entries);
        reconciler
    }

    /// The frozen assistant-era history.
    pub fn baseline(&self) -> &[ChatMessage] {
        &self.baseline
    }

    /// Whether the agent segment is live.
    pub fn is_agent(&self) -> bool {
        matches!(self.segment, Segment::Agent(_))
    }

    /// Number of remote messages observed in the live agent segment.
    pub fn remote_len(&self) -> usize {
        match &self.segment {
            Segment::Agent(agent) => agent.remote.len(),
            Segment::Bot(_) => 0,
        }
    }

    /// Number of sends not yet echoed by the relay.
    pub fn pending_len(&self) -> usize {
        match &self.segment {
            Segment::Agent(agent) => agent.pending.len(),
            Segment::Bot(_) => 0,
        }
    }

    /// Length of the visible transcript.
    pub fn len(&self) -> usize {
        self.baseline.len()
            + match &self.segment {
                Segment::Bot(tail) => tail.len(),
                Segment::Agent(agent) => {
                    agent.remote.len() + agent.notes.len() + agent.pending.len()
                }
            }
    }

    /// Whether the visible transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The ordered visible transcript.
    pub fn visible(&self) -> Vec<ChatMessage> {
        let mut out = Vec::with_capacity(self.len());
        out.extend(self.baseline.iter().cloned());
        match &self.segment {
            Segment::Bot(tail) => out.extend(tail.iter().cloned()),
            Segment::Agent(agent) => {
                let mut notes = agent.notes.iter().peekable();
                for (index, message) in agent.remote.iter().enumerate() {
                    while let Some((_, note)) = notes.next_if(|(anchor, _)| *anchor <= index) {
                        out.push(note.clone());
                    }
                    out.push(message.clone());
                }
                out.extend(notes.map(|(_, note)| note.clone()));
                out.extend(agent.pending.iter().map(|p| p.message.clone()));
            }
        }
        out
    }

    /// Append a locally produced message at the current end of the view.
    pub fn push_local(&mut self, message: ChatMessage) {
        match &mut self.segment {
            Segment::Bot(tail) => tail.push(message),
            Segment::Agent(agent) => {
                let anchor = agent.remote.len();
                agent.notes.push((anchor, message));
            }
        }
    }

    /// Append an outgoing agent-mode message ahead of its relay echo.
    ///
    /// Outside the agent segment the message is appended like any local one.
    pub fn push_pending(&mut self, client_id: impl Into<String>, message: ChatMessage) {
        match &mut self.segment {
            Segment::Agent(agent) => {
                let anchor = agent.remote.len();
                agent.pending.push(PendingSend {
                    client_id: Some(client_id.into()),
                    anchor,
                    message,
                });
            }
            Segment::Bot(tail) => tail.push(message),
        }
    }

    /// Start the agent segment: append `announcement`, then freeze everything
    /// visible so far as the baseline.
    pub fn begin_agent(&mut self, announcement: ChatMessage) {
        self.push_local(announcement);
        self.freeze();
        self.segment = Segment::Agent(AgentSegment::default());
    }

    /// Leave the agent segment: everything observed becomes baseline.
    pub fn end_agent(&mut self) {
        self.freeze();
    }

    fn freeze(&mut self) {
        self.baseline = self.visible();
        self.segment = Segment::Bot(Vec::new());
    }

    /// Merge a remote transcript into the agent segment.
    ///
    /// Returns whether the visible transcript changed.
    pub fn apply_remote(&mut self, entries: Vec<RemoteEntry>) -> bool {
        let Segment::Agent(agent) = &mut self.segment else {
            debug!("Remote transcript ignored outside agent mode");
            return false;
        };

        let known = agent.remote.len();
        if entries.len() < known {
            debug!(known, received = entries.len(), "Ignoring stale remote transcript");
            return false;
        }
        if entries.len() == known {
            return false;
        }

        for (index, entry) in entries.into_iter().enumerate().skip(known) {
            if let Some(pos) = agent.pending.iter().position(|p| p.is_echoed_by(&entry, index)) {
                agent.pending.remove(pos);
            }
            agent.remote.push(entry.message);
        }
        true
    }

    /// Whether the live agent segment already shows a system message
    /// containing `keyword` (case-insensitive).
    pub fn has_agent_system_message(&self, keyword: &str) -> bool {
        let Segment::Agent(agent) = &self.segment else {
            return false;
        };
        let keyword = keyword.to_lowercase();
        agent
            .remote
            .iter()
            .chain(agent.notes.iter().map(|(_, note)| note))
            .any(|m| m.kind == MessageKind::System && m.text.to_lowercase().contains(&keyword))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ts(sec: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, sec).unwrap()
    }

    fn remote(message: ChatMessage) -> RemoteEntry {
        RemoteEntry {
            message,
            client_message_id: None,
        }
    }

    fn echo(text: &str, id: &str) -> RemoteEntry {
        RemoteEntry {
            message: ChatMessage::user(text, ts(30)),
            client_message_id: Some(id.to_string()),
        }
    }

    fn texts(r: &Reconciler) -> Vec<String> {
        r.visible().into_iter().map(|m| m.text).collect()
    }

    fn in_agent_mode() -> Reconciler {
        let mut r = Reconciler::new(vec![ChatMessage::bot("Hello", ts(0))]);
        r.push_local(ChatMessage::user("agent please", ts(1)));
        r.begin_agent(ChatMessage::system("Connected to Alice", ts(2)));
        r
    }

    #[test]
    fn test_begin_agent_freezes_baseline_with_announcement() {
        let r = in_agent_mode();
        assert_eq!(texts(&r), vec!["Hello", "agent please", "Connected to Alice"]);
        assert_eq!(r.baseline().len(), 3);
        assert!(r.is_agent());
    }

    #[test]
    fn test_remote_appended_after_baseline() {
        let mut r = in_agent_mode();
        let changed = r.apply_remote(vec![
            remote(ChatMessage::system("Alice joined", ts(3))),
            remote(ChatMessage::agent("Hi!", "Alice", ts(4))),
        ]);
        assert!(changed);
        assert_eq!(
            texts(&r),
            vec!["Hello", "agent please", "Connected to Alice", "Alice joined", "Hi!"]
        );
    }

    #[test]
    fn test_same_snapshot_twice_is_idempotent() {
        let mut r = in_agent_mode();
        let snapshot = vec![remote(ChatMessage::agent("Hi!", "Alice", ts(4)))];
        assert!(r.apply_remote(snapshot.clone()));
        let before = r.visible();
        assert!(!r.apply_remote(snapshot.clone()));
        assert!(!r.apply_remote(snapshot));
        assert_eq!(r.visible(), before);
    }

    #[test]
    fn test_shorter_snapshot_is_ignored() {
        let mut r = in_agent_mode();
        r.apply_remote(vec![
            remote(ChatMessage::agent("one", "Alice", ts(4))),
            remote(ChatMessage::agent("two", "Alice", ts(5))),
        ]);
        let before = r.visible();
        assert!(!r.apply_remote(vec![remote(ChatMessage::agent("one", "Alice", ts(4)))]));
        assert_eq!(r.visible(), before);
    }

    #[test]
    fn test_pending_retired_by_client_id_echo() {
        let mut r = in_agent_mode();
        r.push_pending("conv-1", ChatMessage::user("My booking failed", ts(10)));
        assert_eq!(r.pending_len(), 1);
        let len = r.len();

        r.apply_remote(vec![echo("My booking failed", "conv-1")]);
        assert_eq!(r.pending_len(), 0);
        assert_eq!(r.len(), len);
        let count = texts(&r)
            .iter()
            .filter(|t| t.as_str() == "My booking failed")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_pending_retired_by_text_without_id() {
        let mut r = in_agent_mode();
        r.push_pending("conv-1", ChatMessage::user("  refund?  ", ts(10)));
        r.apply_remote(vec![remote(ChatMessage::user("refund?", ts(11)))]);
        assert_eq!(r.pending_len(), 0);
        assert_eq!(r.remote_len(), 1);
    }

    #[test]
    fn test_foreign_client_id_does_not_retire_pending() {
        let mut r = in_agent_mode();
        r.push_pending("conv-2", ChatMessage::user("hello", ts(10)));
        r.apply_remote(vec![echo("hello", "other-tab-7")]);
        assert_eq!(r.pending_len(), 1);
    }

    #[test]
    fn test_each_remote_message_retires_one_pending() {
        let mut r = in_agent_mode();
        r.push_pending("c-1", ChatMessage::user("ok", ts(10)));
        r.push_pending("c-2", ChatMessage::user("ok", ts(11)));
        r.apply_remote(vec![remote(ChatMessage::user("ok", ts(12)))]);
        assert_eq!(r.pending_len(), 1);
        r.apply_remote(vec![
            remote(ChatMessage::user("ok", ts(12))),
            remote(ChatMessage::user("ok", ts(13))),
        ]);
        assert_eq!(r.pending_len(), 0);
        assert_eq!(texts(&r).iter().filter(|t| t.as_str() == "ok").count(), 2);
    }

    #[test]
    fn test_earlier_identical_text_does_not_retire_later_send() {
        let mut r = in_agent_mode();
        r.apply_remote(vec![remote(ChatMessage::user("thanks", ts(5)))]);
        r.push_pending("c-1", ChatMessage::user("thanks", ts(10)));
        // Same transcript again: the old "thanks" is not an echo of the new send.
        r.apply_remote(vec![remote(ChatMessage::user("thanks", ts(5)))]);
        assert_eq!(r.pending_len(), 1);
    }

    #[test]
    fn test_visible_length_never_decreases() {
        let mut r = in_agent_mode();
        let mut last = r.len();
        let mut remote_log = Vec::new();
        for i in 0..5u32 {
            r.push_pending(format!("c-{i}"), ChatMessage::user(format!("msg {i}"), ts(10 + i)));
            assert!(r.len() >= last);
            last = r.len();

            remote_log.push(echo(&format!("msg {i}"), &format!("c-{i}")));
            remote_log.push(remote(ChatMessage::agent(format!("reply {i}"), "Alice", ts(20 + i))));
            r.apply_remote(remote_log.clone());
            assert!(r.len() >= last);
            last = r.len();

            // A stale page load never shrinks the view.
            r.apply_remote(remote_log[..1].to_vec());
            assert_eq!(r.len(), last);
        }
    }

    #[test]
    fn test_notes_anchor_between_remote_messages() {
        let mut r = in_agent_mode();
        r.apply_remote(vec![remote(ChatMessage::agent("first", "Alice", ts(4)))]);
        r.push_local(ChatMessage::system("note", ts(5)));
        r.apply_remote(vec![
            remote(ChatMessage::agent("first", "Alice", ts(4))),
            remote(ChatMessage::agent("second", "Alice", ts(6))),
        ]);
        let visible = texts(&r);
        assert_eq!(&visible[3..], &["first", "note", "second"]);
    }

    #[test]
    fn test_end_agent_moves_everything_into_baseline() {
        let mut r = in_agent_mode();
        r.apply_remote(vec![remote(ChatMessage::agent("Hi!", "Alice", ts(4)))]);
        r.push_local(ChatMessage::system("The support session has ended.", ts(5)));
        let visible = r.visible();

        r.end_agent();
        assert!(!r.is_agent());
        assert_eq!(r.baseline(), visible.as_slice());
        assert_eq!(r.visible(), visible);
    }

    #[test]
    fn test_terminal_keyword_lookup() {
        let mut r = in_agent_mode();
        assert!(!r.has_agent_system_message("inactivity"));
        r.apply_remote(vec![remote(ChatMessage::system(
            "Session closed due to INACTIVITY",
            ts(9),
        ))]);
        assert!(r.has_agent_system_message("inactivity"));
        assert!(!r.has_agent_system_message("ended"));
    }

    #[test]
    fn test_remote_ignored_in_bot_mode() {
        let mut r = Reconciler::new(vec![ChatMessage::bot("Hello", ts(0))]);
        assert!(!r.apply_remote(vec![remote(ChatMessage::agent("hi", "Alice", ts(1)))]));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_from_bot_splits_tail() {
        let baseline = vec![ChatMessage::bot("Hello", ts(0))];
        let mut messages = baseline.clone();
        messages.push(ChatMessage::user("hi", ts(1)));
        let r = Reconciler::from_bot(baseline, messages.clone());
        assert_eq!(r.visible(), messages);
        assert_eq!(r.baseline().len(), 1);
    }

    fn agent_era(baseline: &[ChatMessage], rest: &[ChatMessage]) -> Vec<ChatMessage> {
        baseline.iter().chain(rest).cloned().collect()
    }

    #[test]
    fn test_resume_keeps_unechoed_sends_and_notes() {
        let baseline = in_agent_mode().baseline().to_vec();
        let messages = agent_era(
            &baseline,
            &[
                ChatMessage::agent("Hi!", "Alice", ts(4)),
                ChatMessage::system("Your conversation was restored.", ts(5)),
                ChatMessage::user("are you there?", ts(6)),
            ],
        );
        let saved_len = messages.len();
        let entries = vec![remote(ChatMessage::agent("Hi!", "Alice", ts(4)))];

        let mut r = Reconciler::resume_agent(baseline, messages, entries.clone());
        assert!(r.is_agent());
        assert_eq!(r.len(), saved_len);
        assert_eq!(r.remote_len(), 1);
        assert_eq!(r.pending_len(), 1);
        assert_eq!(&texts(&r)[3..], &["Hi!", "Your conversation was restored.", "are you there?"]);

        // The relay records the send later, under a client id from the old page.
        let mut later = entries;
        later.push(echo("are you there?", "old-page-0"));
        assert!(r.apply_remote(later));
        assert_eq!(r.pending_len(), 0);
        assert_eq!(r.len(), saved_len);
    }

    #[test]
    fn test_resume_appends_messages_missed_while_away() {
        let baseline = in_agent_mode().baseline().to_vec();
        let messages = agent_era(&baseline, &[ChatMessage::agent("Hi!", "Alice", ts(4))]);
        let entries = vec![
            remote(ChatMessage::agent("Hi!", "Alice", ts(4))),
            remote(ChatMessage::agent("Still there?", "Alice", ts(40))),
        ];

        let r = Reconciler::resume_agent(baseline, messages, entries);
        assert_eq!(&texts(&r)[3..], &["Hi!", "Still there?"]);
        assert_eq!(r.remote_len(), 2);
    }

    #[test]
    fn test_resume_with_stale_remote_keeps_saved_messages() {
        let baseline = in_agent_mode().baseline().to_vec();
        let messages = agent_era(
            &baseline,
            &[
                ChatMessage::agent("one", "Alice", ts(4)),
                ChatMessage::agent("two", "Alice", ts(5)),
            ],
        );
        let saved = messages.clone();
        let entries = vec![remote(ChatMessage::agent("one", "Alice", ts(4)))];

        let r = Reconciler::resume_agent(baseline, messages, entries);
        assert_eq!(r.visible(), saved);
    }
}
