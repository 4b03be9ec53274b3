//! Live-support handoff for the CareLine support chat.
//!
//! Hands a conversation from the automated assistant to a human agent
//! reached through the support relay, keeps the transcript consistent across
//! reloads and network hiccups, and falls back to the assistant whenever a
//! remote call fails.
//!
//! # Main types
//!
//! - [`ChatController`] — Single owner of the conversation; the UI-facing contract.
//! - [`ChatMode`] — `Bot | Connecting | Agent { .. } | Ending`.
//! - [`Reconciler`] — Merges assistant and agent transcripts into one ordered view.
//! - [`Poller`] — Background fetch of the remote session while an agent is attached.
//! - [`AvailabilityGate`] — Authentication precondition, availability check and handoff call.
//! - [`HandoffConfig`] — Timing, TTL and greeting settings.

/// Quick-action routing.
pub mod actions;
/// Handoff settings.
pub mod config;
/// The conversation controller.
pub mod controller;
/// Availability check and handoff call.
pub mod gate;
/// Conversation mode.
pub mod mode;
/// Remote session polling.
pub mod poller;
/// Transcript reconciliation.
pub mod reconciler;

pub use actions::{ActionOutcome, Route};
pub use config::{HandoffConfig, MAX_SNAPSHOT_TTL_DAYS};
pub use controller::ChatController;
pub use gate::{AvailabilityGate, HandoffRefusal};
pub use mode::ChatMode;
pub use poller::{EndReason, PollEvent, Poller, RemoteEntry};
pub use reconciler::Reconciler;
