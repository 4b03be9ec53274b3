//! Client-visible contracts of the CareLine external collaborators.
//!
//! The support relay hands conversations to human agents and keeps the
//! remote transcript; the assistant answers while no human is attached.
//! Both are consumed through traits so the handoff controller can be
//! driven by in-process fakes in tests.
//!
//! # Main types
//!
//! - [`SessionService`] — Remote session contract ([`HttpSessionService`]).
//! - [`BotResponder`] — Automated-response contract ([`HttpBotResponder`]).
//! - [`RemoteSession`] / [`RemoteMessage`] — Relay wire types.

/// Automated assistant client.
pub mod bot;
/// Relay and assistant endpoint configuration.
pub mod config;
/// HTTP implementation of [`SessionService`].
pub mod http;
/// The session service trait.
pub mod service;
/// Relay wire types.
pub mod types;

pub use bot::{BotReply, BotResponder, HttpBotResponder};
pub use config::{BotConfig, RelayConfig};
pub use http::HttpSessionService;
pub use service::SessionService;
pub use types::{
    AgentAssignment, AgentInfo, OutgoingMessage, RemoteMessage, RemoteSender, RemoteSession,
    SessionStatus,
};
