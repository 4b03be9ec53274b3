use serde::{Deserialize, Serialize};

/// Connection settings for the support relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Base URL of the relay API, e.g. `https://relay.example.com/v1`.
    pub base_url: String,
    /// Optional bearer token.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_relay_timeout")]
    pub request_timeout_secs: u64,
}

/// Connection settings for the automated assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Endpoint that answers `{ "message": ... }` requests.
    pub url: String,
    /// Optional bearer token.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_bot_timeout")]
    pub request_timeout_secs: u64,
}

fn default_relay_timeout() -> u64 {
    10
}

fn default_bot_timeout() -> u64 {
    30
}

impl RelayConfig {
    /// Settings for `base_url` with defaults everywhere else.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            request_timeout_secs: default_relay_timeout(),
        }
    }
}

impl BotConfig {
    /// Settings for `url` with defaults everywhere else.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            request_timeout_secs: default_bot_timeout(),
        }
    }
}
