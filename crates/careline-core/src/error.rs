use thiserror::Error;

/// A convenience `Result` alias using [`CarelineError`].
pub type CarelineResult<T> = Result<T, CarelineError>;

/// Top-level error type for the CareLine support chat.
///
/// The first five variants are the handoff taxonomy the controller reacts to;
/// the rest describe transport, storage and configuration faults.
#[derive(Error, Debug)]
pub enum CarelineError {
    /// The caller identity is unknown; recoverable by logging in.
    #[error("Authentication required")]
    Unauthenticated,

    /// No human agent is currently reachable through the relay.
    #[error("No agent available")]
    NoAgentAvailable,

    /// The handoff call failed for a transient reason.
    #[error("Handoff error: {0}")]
    Handoff(String),

    /// The relay does not know the requested session.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// A persisted snapshot could not be parsed or violates an invariant.
    #[error("Corrupt snapshot: {0}")]
    PersistenceCorrupt(String),

    /// The durable key-value store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An outbound HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The automated-response service failed.
    #[error("Bot error: {0}")]
    Bot(String),

    /// Configuration parsing or validation failed.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CarelineError {
    /// Whether this failure means the relay no longer knows the session.
    ///
    /// Besides [`CarelineError::SessionNotFound`], any error whose message
    /// mentions "not found" qualifies; relays are not consistent about
    /// status codes for expired sessions.
    pub fn indicates_unknown_session(&self) -> bool {
        match self {
            CarelineError::SessionNotFound(_) => true,
            other => other.to_string().to_lowercase().contains("not found"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_session_classification() {
        assert!(CarelineError::SessionNotFound("S1".into()).indicates_unknown_session());
        assert!(CarelineError::Http("404 Session Not Found".into()).indicates_unknown_session());
        assert!(!CarelineError::Http("502 Bad Gateway".into()).indicates_unknown_session());
        assert!(!CarelineError::NoAgentAvailable.indicates_unknown_session());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            CarelineError::Handoff("relay offline".into()).to_string(),
            "Handoff error: relay offline"
        );
        assert_eq!(CarelineError::Unauthenticated.to_string(), "Authentication required");
    }
}
