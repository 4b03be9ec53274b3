//! Core types and error definitions for the CareLine support chat.
//!
//! This crate provides the foundational types shared across all CareLine
//! crates: the chat transcript message, the closed quick-action vocabulary,
//! the injectable clock, and the unified error enum.
//!
//! # Main types
//!
//! - [`CarelineError`] — Unified error enum for all CareLine subsystems.
//! - [`CarelineResult`] — Convenience alias for `Result<T, CarelineError>`.
//! - [`ChatMessage`] — A single immutable transcript entry.
//! - [`QuickAction`] — Labeled control attached to a message.
//! - [`Clock`] — Wall-clock capability injected into stateful components.

/// Wall-clock capability.
pub mod clock;
/// Error taxonomy.
pub mod error;
/// Transcript messages and transient notices.
pub mod message;
/// Quick-action vocabulary.
pub mod quick_action;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CarelineError, CarelineResult};
pub use message::{ChatMessage, MessageKind, Notice, NoticeLevel};
pub use quick_action::{FollowUpOption, QuickAction};
