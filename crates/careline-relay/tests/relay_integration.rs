//! HTTP adapter tests against a mock relay and assistant.

use careline_core::{CarelineError, FollowUpOption, QuickAction};
use careline_relay::{
    BotConfig, BotResponder, HttpBotResponder, HttpSessionService, OutgoingMessage, RelayConfig,
    RemoteSender, SessionService, SessionStatus,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn relay() -> (MockServer, HttpSessionService) {
    let server = MockServer::start().await;
    let service = HttpSessionService::new(&RelayConfig::new(format!("{}/v1", server.uri()))).unwrap();
    (server, service)
}

#[tokio::test]
async fn test_get_session_parses_transcript() {
    let (server, service) = relay().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions/S1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "session": {
                "status": "connected",
                "agent": { "name": "Alice" },
                "messages": [
                    { "sender": "system", "message": "Alice joined", "timestamp": "2025-03-01T10:00:00Z" },
                    { "sender": "agent", "message": "Hi there", "timestamp": "2025-03-01T10:00:05Z", "senderName": "Alice" },
                    { "sender": "user", "message": "Hello", "timestamp": "2025-03-01T10:00:09Z", "clientMessageId": "c-1" }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = service.get_session("S1").await.unwrap();
    assert_eq!(session.status, SessionStatus::Connected);
    assert_eq!(session.agent_name(), Some("Alice"));
    let senders: Vec<RemoteSender> = session.messages.iter().map(|m| m.sender).collect();
    assert_eq!(
        senders,
        vec![RemoteSender::System, RemoteSender::Agent, RemoteSender::User]
    );
    assert_eq!(session.messages[2].client_message_id.as_deref(), Some("c-1"));
}

#[tokio::test]
async fn test_get_session_404_is_session_not_found() {
    let (server, service) = relay().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions/GONE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = service.get_session("GONE").await.unwrap_err();
    assert!(matches!(err, CarelineError::SessionNotFound(ref id) if id == "GONE"));
    assert!(err.indicates_unknown_session());
}

#[tokio::test]
async fn test_get_session_error_body_not_found() {
    let (server, service) = relay().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions/S9"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "Session not found" })),
        )
        .mount(&server)
        .await;

    let err = service.get_session("S9").await.unwrap_err();
    assert!(err.indicates_unknown_session());
}

#[tokio::test]
async fn test_get_session_server_error_is_transient() {
    let (server, service) = relay().await;
    Mock::given(method("GET"))
        .and(path("/v1/sessions/S1"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = service.get_session("S1").await.unwrap_err();
    assert!(matches!(err, CarelineError::Http(_)));
    assert!(!err.indicates_unknown_session());
}

#[tokio::test]
async fn test_check_availability() {
    let (server, service) = relay().await;
    Mock::given(method("GET"))
        .and(path("/v1/availability"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "available": false })),
        )
        .mount(&server)
        .await;

    assert!(!service.check_availability().await.unwrap());
}

#[tokio::test]
async fn test_connect_to_agent_success() {
    let (server, service) = relay().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .and(body_json(serde_json::json!({ "userId": "user-42" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sessionId": "S1",
            "agentName": "Alice"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let assignment = service.connect_to_agent("user-42").await.unwrap();
    assert_eq!(assignment.session_id, "S1");
    assert_eq!(assignment.agent_name, "Alice");
}

#[tokio::test]
async fn test_connect_to_agent_no_agent() {
    let (server, service) = relay().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = service.connect_to_agent("user-42").await.unwrap_err();
    assert!(matches!(err, CarelineError::NoAgentAvailable));
}

#[tokio::test]
async fn test_connect_to_agent_error_code_no_agent() {
    let (server, service) = relay().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "no_agent_available" })),
        )
        .mount(&server)
        .await;

    let err = service.connect_to_agent("user-42").await.unwrap_err();
    assert!(matches!(err, CarelineError::NoAgentAvailable));
}

#[tokio::test]
async fn test_connect_to_agent_failure_is_handoff_error() {
    let (server, service) = relay().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("relay exploded"))
        .mount(&server)
        .await;

    let err = service.connect_to_agent("user-42").await.unwrap_err();
    assert!(matches!(err, CarelineError::Handoff(ref m) if m.contains("relay exploded")));
}

#[tokio::test]
async fn test_send_message_posts_client_id() {
    let (server, service) = relay().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/S1/messages"))
        .and(body_json(serde_json::json!({
            "message": "My booking failed",
            "role": "user",
            "clientMessageId": "conv-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let message = OutgoingMessage {
        message: "My booking failed".into(),
        role: RemoteSender::User,
        client_message_id: "conv-1".into(),
    };
    service.send_message("S1", &message).await.unwrap();
}

#[tokio::test]
async fn test_end_session_is_idempotent() {
    let (server, service) = relay().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/S1/end"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/OLD/end"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    service.end_session("S1").await.unwrap();
    service.end_session("OLD").await.unwrap();
}

#[tokio::test]
async fn test_api_key_sent_as_bearer() {
    let server = MockServer::start().await;
    let mut config = RelayConfig::new(server.uri());
    config.api_key = Some("secret".into());
    let service = HttpSessionService::new(&config).unwrap();

    Mock::given(method("GET"))
        .and(path("/availability"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "available": true })),
        )
        .expect(1)
        .mount(&server)
        .await;

    assert!(service.check_availability().await.unwrap());
}

#[test]
fn test_invalid_base_url_rejected() {
    let err = HttpSessionService::new(&RelayConfig::new("not a url")).err().unwrap();
    assert!(matches!(err, CarelineError::Config(_)));
}

#[tokio::test]
async fn test_bot_reply_with_follow_ups() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(serde_json::json!({ "message": "prices?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "Here are our prices.",
            "followUpOptions": [
                { "label": "See pricing", "action": "view_pricing" },
                { "label": "Unknown", "action": "dance" }
            ]
        })))
        .mount(&server)
        .await;

    let bot = HttpBotResponder::new(&BotConfig::new(format!("{}/chat", server.uri()))).unwrap();
    let reply = bot.get_response("prices?").await.unwrap();
    assert_eq!(reply.response, "Here are our prices.");
    assert_eq!(
        reply.follow_up_options,
        vec![FollowUpOption::new("See pricing", QuickAction::ViewPricing)]
    );
}

#[tokio::test]
async fn test_bot_failure_is_bot_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let bot = HttpBotResponder::new(&BotConfig::new(format!("{}/chat", server.uri()))).unwrap();
    let err = bot.get_response("hello").await.unwrap_err();
    assert!(matches!(err, CarelineError::Bot(_)));
}
