/*
[INPUT]:  Mock auth endpoint responses
[OUTPUT]: Test results for the session lifecycle
[POS]:    Integration tests - login, register, logout, refresh
[UPDATE]: When auth endpoints or session rules change
*/

mod common;

use std::time::Duration;

use common::{
    client_for, client_with_interval, drain, eventually, forced_logouts, logged_in_session,
    message_body, mount_login, setup_mock_server, token_body,
};
use taskpad_client::{SessionManager, TaskpadError};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_login_stores_token_and_identity() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(serde_json::json!({
            "email": "ada@example.com",
            "password": "pw",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-1")))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionManager::new(client_for(&server));
    let outcome = session.login("ada@example.com", "pw").await;

    assert!(outcome.success);
    assert_eq!(outcome.error, None);
    assert!(session.is_authenticated());
    assert_eq!(session.access_token().as_deref(), Some("tok-1"));
    assert_eq!(session.client().access_token().as_deref(), Some("tok-1"));
    assert_eq!(session.user().map(|user| user.email), Some("ada@example.com".to_string()));
    assert!(session.auto_refresh_armed());
}

#[tokio::test]
async fn test_login_failure_uses_backend_message_without_refresh() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(message_body("Invalid credentials")))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("never")))
        .expect(0)
        .mount(&server)
        .await;

    let session = SessionManager::new(client_for(&server));
    let outcome = session.login("ada@example.com", "wrong").await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Invalid credentials"));
    assert!(!session.is_authenticated());
    assert!(!session.auto_refresh_armed());
}

#[tokio::test]
async fn test_login_failure_without_message_falls_back() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = SessionManager::new(client_for(&server));
    let outcome = session.login("ada@example.com", "wrong").await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Login failed"));
}

#[tokio::test]
async fn test_register_failure_without_message_falls_back() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = SessionManager::new(client_for(&server));
    let outcome = session.register("Ada", "ada@example.com", "pw").await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Registration failed"));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_register_records_name() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(serde_json::json!({
            "name": "Ada",
            "email": "ada@example.com",
            "password": "pw",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(token_body("tok-reg")))
        .mount(&server)
        .await;

    let session = SessionManager::new(client_for(&server));
    let outcome = session.register("Ada", "ada@example.com", "pw").await;

    assert!(outcome.success);
    let user = session.user().expect("user");
    assert_eq!(user.name.as_deref(), Some("Ada"));
    assert_eq!(session.access_token().as_deref(), Some("tok-reg"));
}

#[tokio::test]
async fn test_register_conflict_reports_message() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(409).set_body_json(message_body("User already exists")))
        .mount(&server)
        .await;

    let session = SessionManager::new(client_for(&server));
    let outcome = session.register("Ada", "ada@example.com", "pw").await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("User already exists"));
}

#[tokio::test]
async fn test_logout_clears_session_even_when_backend_fails() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let session = logged_in_session(&server, "tok-1").await;

    let outcome = session.logout().await;

    assert!(outcome.success);
    assert!(!session.is_authenticated());
    assert_eq!(session.user(), None);
    assert_eq!(session.client().access_token(), None);
    assert!(!session.auto_refresh_armed());
}

#[tokio::test]
async fn test_logout_stops_auto_refresh() {
    let server = setup_mock_server().await;
    mount_login(&server, "tok-1").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-2")))
        .expect(0)
        .mount(&server)
        .await;

    let session = SessionManager::new(client_with_interval(&server, Duration::from_millis(100)));
    assert!(session.login("user@example.com", "secret").await.success);
    assert!(session.logout().await.success);

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_auto_refresh_rotates_token() {
    let server = setup_mock_server().await;
    mount_login(&server, "tok-1").await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-2")))
        .mount(&server)
        .await;

    let session = SessionManager::new(client_with_interval(&server, Duration::from_millis(50)));
    assert!(session.login("user@example.com", "secret").await.success);

    let rotated = eventually(|| session.access_token().as_deref() == Some("tok-2")).await;
    assert!(rotated, "auto-refresh never rotated the token");
    assert_eq!(session.client().access_token().as_deref(), Some("tok-2"));
    session.shutdown();
}

#[tokio::test]
async fn test_refresh_failure_forces_single_logout() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(message_body("No refresh token")))
        .expect(1)
        .mount(&server)
        .await;
    let session = logged_in_session(&server, "tok-1").await;
    let mut events = session.client().events().subscribe();

    let outcome = session.refresh().await;

    assert!(!outcome.success);
    assert_eq!(
        outcome.error,
        Some(TaskpadError::SessionExpired.to_string())
    );
    assert!(!session.is_authenticated());
    assert_eq!(session.access_token(), None);
    assert_eq!(session.user(), None);
    assert_eq!(session.client().access_token(), None);
    assert_eq!(forced_logouts(&drain(&mut events)), 1);
}

#[tokio::test]
async fn test_refresh_sends_cookie_issued_at_login() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refreshToken=r-1; Path=/; HttpOnly")
                .set_body_json(token_body("tok-1")),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(wiremock::matchers::header("cookie", "refreshToken=r-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-2")))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionManager::new(client_for(&server));
    assert!(session.login("user@example.com", "secret").await.success);
    let outcome = session.refresh().await;

    assert!(outcome.success, "refresh failed: {:?}", outcome.error);
    assert_eq!(session.access_token().as_deref(), Some("tok-2"));
}
