/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for taskpad-client tests

#![allow(dead_code)]

use std::time::Duration;

use taskpad_client::{ClientConfig, ClientEvent, SessionManager, TaskpadClient};
use tokio::sync::broadcast;
use tokio_test::assert_ok;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn client_for(server: &MockServer) -> TaskpadClient {
    client_with_interval(server, Duration::from_secs(600))
}

pub fn client_with_interval(server: &MockServer, refresh_interval: Duration) -> TaskpadClient {
    let config = ClientConfig::default()
        .with_base_url(server.uri())
        .with_refresh_interval(refresh_interval);
    assert_ok!(TaskpadClient::with_config(config))
}

pub fn token_body(token: &str) -> serde_json::Value {
    serde_json::json!({ "accessToken": token })
}

pub fn message_body(message: &str) -> serde_json::Value {
    serde_json::json!({ "message": message })
}

pub fn task_json(id: &str, input: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "_id": id,
        "inputText": input,
        "status": status,
        "createdAt": "2026-01-01T00:00:00Z",
        "updatedAt": "2026-01-01T00:00:00Z",
    })
}

/// Mount a login endpoint answering with `token`
pub async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(token)))
        .mount(server)
        .await;
}

/// Log a fresh session manager in with `token` as the issued access token
pub async fn logged_in_session(server: &MockServer, token: &str) -> SessionManager {
    mount_login(server, token).await;
    let session = SessionManager::new(client_for(server));
    let outcome = session.login("user@example.com", "secret").await;
    assert!(outcome.success, "login failed: {:?}", outcome.error);
    session
}

/// Everything published so far, without waiting
pub fn drain(events: &mut broadcast::Receiver<ClientEvent>) -> Vec<ClientEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

pub fn forced_logouts(events: &[ClientEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, ClientEvent::ForcedLogout))
        .count()
}

/// Poll until `condition` holds or a second passes
pub async fn eventually<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
