use crate::config::BotConfig;
use async_trait::async_trait;
use careline_core::{CarelineError, CarelineResult, FollowUpOption, QuickAction};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Reply from the automated assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotReply {
    /// Reply text.
    pub response: String,
    /// Quick-actions to show under the reply.
    pub follow_up_options: Vec<FollowUpOption>,
}

impl BotReply {
    /// A plain-text reply without quick-actions.
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            follow_up_options: Vec::new(),
        }
    }
}

/// Opaque text-in/text-out automated assistant.
#[async_trait]
pub trait BotResponder: Send + Sync {
    /// Produce a reply for the user's message.
    async fn get_response(&self, text: &str) -> CarelineResult<BotReply>;
}

/// Assistant reached over HTTP: `POST {url}` with `{ "message": text }`.
pub struct HttpBotResponder {
    url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct BotRequest<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BotResponseBody {
    response: String,
    #[serde(default)]
    follow_up_options: Vec<RawOption>,
}

#[derive(Debug, Deserialize)]
struct RawOption {
    label: String,
    action: String,
}

impl HttpBotResponder {
    /// Build a client from config.
    pub fn new(config: &BotConfig) -> CarelineResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CarelineError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            http,
        })
    }
}

/// Keep only options whose action is part of the quick-action vocabulary.
fn known_options(raw: Vec<RawOption>) -> Vec<FollowUpOption> {
    raw.into_iter()
        .filter_map(|o| match o.action.parse::<QuickAction>() {
            Ok(action) => Some(FollowUpOption::new(o.label, action)),
            Err(e) => {
                debug!(error = %e, "Dropping unknown follow-up option");
                None
            }
        })
        .collect()
}

#[async_trait]
impl BotResponder for HttpBotResponder {
    async fn get_response(&self, text: &str) -> CarelineResult<BotReply> {
        let mut request = self.http.post(&self.url).json(&BotRequest { message: text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CarelineError::Bot(format!("Assistant request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CarelineError::Bot(format!("Assistant returned {status}: {body}")));
        }

        let body: BotResponseBody = response
            .json()
            .await
            .map_err(|e| CarelineError::Bot(format!("Assistant parse error: {e}")))?;

        Ok(BotReply {
            response: body.response,
            follow_up_options: known_options(body.follow_up_options),
        })
    }
}
