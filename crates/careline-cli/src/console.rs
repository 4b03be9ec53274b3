use careline_core::{ChatMessage, MessageKind, Notice, NoticeLevel, QuickAction};

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Say(String),
    Agent,
    End,
    /// `/action <n|name>`: a 1-based option index or an action wire name.
    Action(String),
    Login(String),
    Logout,
    Clear,
    Help,
    Quit,
    Unknown(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix('/') else {
            return Input::Say(line.to_string());
        };
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        match (name, arg) {
            ("agent", _) => Input::Agent,
            ("end", _) => Input::End,
            ("action" | "a", arg) if !arg.is_empty() => Input::Action(arg.to_string()),
            ("login", arg) if !arg.is_empty() => Input::Login(arg.to_string()),
            ("logout", _) => Input::Logout,
            ("clear", _) => Input::Clear,
            ("help" | "?", _) => Input::Help,
            ("quit" | "exit" | "q", _) => Input::Quit,
            _ => Input::Unknown(line.to_string()),
        }
    }
}

/// Resolve an `/action` argument against the options of the most recent
/// message that offers any.
pub fn resolve_action(arg: &str, transcript: &[ChatMessage]) -> Option<QuickAction> {
    if let Ok(index) = arg.parse::<usize>() {
        let options = transcript
            .iter()
            .rev()
            .find(|m| !m.follow_up_options.is_empty())
            .map(|m| m.follow_up_options.as_slice())?;
        return index
            .checked_sub(1)
            .and_then(|i| options.get(i))
            .map(|o| o.action);
    }
    arg.parse().ok()
}

pub fn format_message(message: &ChatMessage) -> String {
    let time = message.timestamp.format("%H:%M");
    let who = match message.kind {
        MessageKind::User => "You".to_string(),
        MessageKind::Bot => "Assistant".to_string(),
        MessageKind::Agent => message
            .sender_name
            .clone()
            .unwrap_or_else(|| "Agent".to_string()),
        MessageKind::System => "*".to_string(),
    };
    let mut out = format!("[{time}] {who}: {}", message.text);
    for (i, option) in message.follow_up_options.iter().enumerate() {
        out.push_str(&format!("\n        {}) {} [{}]", i + 1, option.label, option.action));
    }
    out
}

pub fn format_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Warning => "warn",
        NoticeLevel::Error => "error",
    };
    format!("  ({tag}) {}", notice.text)
}

pub const HELP: &str = "\
Commands:
  /agent              talk to a human support agent
  /end                end the agent session
  /action <n|name>    choose a quick-action (by number or name)
  /login <user-id>    set your identity
  /logout             clear your identity
  /clear              forget this conversation
  /quit               leave (the conversation is kept)";
