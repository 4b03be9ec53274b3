use careline_handoff::HandoffConfig;
use careline_relay::{BotConfig, RelayConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding `user_id`.
pub const USER_ID_ENV: &str = "CARELINE_USER_ID";
/// Environment variable overriding `relay.api_key`.
pub const RELAY_KEY_ENV: &str = "CARELINE_RELAY_API_KEY";

/// Contents of `careline.toml`.
#[derive(Debug, Deserialize)]
pub struct CarelineConfig {
    pub relay: RelayConfig,
    pub bot: BotConfig,
    #[serde(default)]
    pub handoff: HandoffConfig,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Identity used for handoff when none is given on the command line.
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl CarelineConfig {
    /// Read and parse the config file, then apply environment overrides.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        let config = Self::parse(&raw)?.with_overrides(
            std::env::var(USER_ID_ENV).ok(),
            std::env::var(RELAY_KEY_ENV).ok(),
        );
        Ok(config)
    }

    /// Parse config text.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply overrides; blank values are ignored.
    pub fn with_overrides(mut self, user_id: Option<String>, relay_key: Option<String>) -> Self {
        if let Some(user_id) = user_id.filter(|v| !v.trim().is_empty()) {
            self.user_id = Some(user_id);
        }
        if let Some(key) = relay_key.filter(|v| !v.trim().is_empty()) {
            self.relay.api_key = Some(key);
        }
        self
    }

    /// Directory holding the chat snapshot.
    pub fn state_dir(&self) -> PathBuf {
        self.data_dir.join("state")
    }
}
