use crate::quick_action::FollowUpOption;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// The end-user.
    User,
    /// The automated assistant.
    Bot,
    /// A human support agent reached through the relay.
    Agent,
    /// A synthetic status line (connection, session end, errors).
    System,
}

/// A single entry of the visible transcript.
///
/// Messages are immutable once appended; transcript order is insertion
/// order and is never re-sorted by timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// The author of the message.
    pub kind: MessageKind,
    /// The textual content.
    pub text: String,
    /// When the message was created (or observed, for remote messages).
    pub timestamp: DateTime<Utc>,
    /// Display name of the author, when known (agents).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    /// Quick-actions offered alongside this message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub follow_up_options: Vec<FollowUpOption>,
}

impl ChatMessage {
    /// Creates a message of the given kind.
    pub fn new(kind: MessageKind, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            text: text.into(),
            timestamp,
            sender_name: None,
            follow_up_options: Vec::new(),
        }
    }

    /// Creates a message with [`MessageKind::User`].
    pub fn user(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(MessageKind::User, text, timestamp)
    }

    /// Creates a message with [`MessageKind::Bot`].
    pub fn bot(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(MessageKind::Bot, text, timestamp)
    }

    /// Creates a message with [`MessageKind::System`].
    pub fn system(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(MessageKind::System, text, timestamp)
    }

    /// Creates a message with [`MessageKind::Agent`] signed by `sender_name`.
    pub fn agent(
        text: impl Into<String>,
        sender_name: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(MessageKind::Agent, text, timestamp).with_sender(sender_name)
    }

    /// Sets the display name of the author.
    pub fn with_sender(mut self, sender_name: impl Into<String>) -> Self {
        self.sender_name = Some(sender_name.into());
        self
    }

    /// Attaches quick-actions to the message.
    pub fn with_options(mut self, options: Vec<FollowUpOption>) -> Self {
        self.follow_up_options = options;
        self
    }
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Something degraded but the chat continues.
    Warning,
    /// An operation failed.
    Error,
}

/// A transient notification ("toast") shown next to the transcript.
///
/// Notices are never persisted and never part of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Human-readable text.
    pub text: String,
}

impl Notice {
    /// Creates an informational notice.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    /// Creates a warning notice.
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    /// Creates an error notice.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}
