use crate::config::RelayConfig;
use crate::service::SessionService;
use crate::types::{AgentAssignment, OutgoingMessage, RemoteSession};
use async_trait::async_trait;
use careline_core::{CarelineError, CarelineResult};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Error code the relay returns when the agent pool is empty.
const NO_AGENT_CODE: &str = "no_agent_available";

/// Support relay client speaking the CareLine REST contract.
///
/// | Operation | Request |
/// |---|---|
/// | `get_session` | `GET {base}/sessions/{id}` |
/// | `check_availability` | `GET {base}/availability` |
/// | `connect_to_agent` | `POST {base}/sessions` |
/// | `send_message` | `POST {base}/sessions/{id}/messages` |
/// | `end_session` | `POST {base}/sessions/{id}/end` |
pub struct HttpSessionService {
    base_url: Url,
    api_key: Option<String>,
    http: reqwest::Client,
}

// ── Relay response types ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SessionEnvelope {
    #[serde(default)]
    session: Option<RemoteSession>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    available: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectResponse {
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    agent_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectRequest<'a> {
    user_id: &'a str,
}

// ── Implementation ──────────────────────────────────────────────────────────

impl HttpSessionService {
    /// Build a client from config.
    pub fn new(config: &RelayConfig) -> CarelineResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            CarelineError::Config(format!("Invalid relay base_url '{}': {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CarelineError::Config(format!(
                "Relay base_url '{}' cannot be a base URL",
                config.base_url
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CarelineError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url,
            api_key: config.api_key.clone(),
            http,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejected cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> CarelineResult<reqwest::Response> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| CarelineError::Http(format!("Relay request failed: {e}")))
    }
}

async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    }
}

#[async_trait]
impl SessionService for HttpSessionService {
    async fn get_session(&self, session_id: &str) -> CarelineResult<RemoteSession> {
        let url = self.endpoint(&["sessions", session_id]);
        let response = self.send(self.http.get(url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CarelineError::SessionNotFound(session_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(CarelineError::Http(error_body(response).await));
        }

        let body: SessionEnvelope = response
            .json()
            .await
            .map_err(|e| CarelineError::Http(format!("Relay parse error: {e}")))?;

        match (body.session, body.error) {
            (Some(session), _) => Ok(session),
            (None, Some(error)) if error.to_lowercase().contains("not found") => {
                Err(CarelineError::SessionNotFound(session_id.to_string()))
            }
            (None, Some(error)) => Err(CarelineError::Http(format!("Relay error: {error}"))),
            (None, None) => Err(CarelineError::Http(
                "Relay response carried no session".to_string(),
            )),
        }
    }

    async fn check_availability(&self) -> CarelineResult<bool> {
        let url = self.endpoint(&["availability"]);
        let response = self.send(self.http.get(url)).await?;
        if !response.status().is_success() {
            return Err(CarelineError::Http(error_body(response).await));
        }
        let body: AvailabilityResponse = response
            .json()
            .await
            .map_err(|e| CarelineError::Http(format!("Relay parse error: {e}")))?;
        debug!(available = body.available, "Agent availability checked");
        Ok(body.available)
    }

    async fn connect_to_agent(&self, user_id: &str) -> CarelineResult<AgentAssignment> {
        let url = self.endpoint(&["sessions"]);
        let response = self
            .send(self.http.post(url).json(&ConnectRequest { user_id }))
            .await
            .map_err(|e| CarelineError::Handoff(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(CarelineError::NoAgentAvailable);
        }
        if !status.is_success() {
            return Err(CarelineError::Handoff(error_body(response).await));
        }

        let body: ConnectResponse = response
            .json()
            .await
            .map_err(|e| CarelineError::Handoff(format!("Relay parse error: {e}")))?;

        if let Some(error) = body.error {
            if error == NO_AGENT_CODE {
                return Err(CarelineError::NoAgentAvailable);
            }
            return Err(CarelineError::Handoff(error));
        }

        match (body.session_id, body.agent_name) {
            (Some(session_id), Some(agent_name)) if !session_id.is_empty() => {
                Ok(AgentAssignment {
                    session_id,
                    agent_name,
                })
            }
            _ => Err(CarelineError::Handoff(
                "Relay response is missing sessionId or agentName".to_string(),
            )),
        }
    }

    async fn send_message(
        &self,
        session_id: &str,
        message: &OutgoingMessage,
    ) -> CarelineResult<()> {
        let url = self.endpoint(&["sessions", session_id, "messages"]);
        let response = self.send(self.http.post(url).json(message)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CarelineError::SessionNotFound(session_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(CarelineError::Http(error_body(response).await));
        }
        Ok(())
    }

    async fn end_session(&self, session_id: &str) -> CarelineResult<()> {
        let url = self.endpoint(&["sessions", session_id, "end"]);
        let response = self.send(self.http.post(url)).await?;

        // Already gone on the relay side; ending is idempotent.
        if response.status() == StatusCode::NOT_FOUND {
            debug!(session_id = %session_id, "End requested for unknown session");
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(CarelineError::Http(error_body(response).await));
        }
        Ok(())
    }
}
