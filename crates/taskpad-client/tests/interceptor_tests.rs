/*
[INPUT]:  Mock task endpoints answering 401/5xx
[OUTPUT]: Test results for bearer injection, silent refresh and notices
[POS]:    Integration tests - request/response interceptors
[UPDATE]: When retry or notice rules change
*/

mod common;

use common::{
    client_for, drain, eventually, forced_logouts, logged_in_session, message_body,
    setup_mock_server, task_json, token_body,
};
use taskpad_client::http::SESSION_EXPIRED_NOTICE;
use taskpad_client::{ClientConfig, ClientEvent, NoticeLevel, TaskStatus, TaskpadClient, TaskpadError};
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn notices(events: &[ClientEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            ClientEvent::Notice {
                level: NoticeLevel::Error,
                message,
            } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_bearer_token_attached() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/t1"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "data": task_json("t1", "hi", "pending") })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let session = logged_in_session(&server, "tok-1").await;

    let task = assert_ok!(session.client().get_task("t1").await);
    assert_eq!(task.id, "t1");
    assert_eq!(task.status, TaskStatus::Pending);
}

#[tokio::test]
async fn test_401_refreshes_once_and_retries_with_new_token() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .and(header("authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(message_body("Token expired")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("new")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .and(header("authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": [task_json("t1", "hi", "completed")],
        })))
        .expect(1)
        .mount(&server)
        .await;
    let session = logged_in_session(&server, "old").await;
    let mut events = session.client().events().subscribe();

    let tasks = session.client().list_tasks().await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(session.client().access_token().as_deref(), Some("new"));
    let published = drain(&mut events);
    assert!(published.contains(&ClientEvent::TokenRotated {
        access_token: "new".to_string()
    }));
    assert!(notices(&published).is_empty());

    let adopted = eventually(|| session.access_token().as_deref() == Some("new")).await;
    assert!(adopted, "session did not adopt the rotated token");
}

#[tokio::test]
async fn test_second_401_is_not_retried_again() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(401).set_body_json(message_body("Still unauthorized")))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("new")))
        .expect(1)
        .mount(&server)
        .await;
    let session = logged_in_session(&server, "old").await;
    let mut events = session.client().events().subscribe();

    let err = session.client().list_tasks().await.unwrap_err();

    assert!(matches!(err, TaskpadError::Unauthorized { ref message, .. } if message == "Still unauthorized"));
    let published = drain(&mut events);
    assert_eq!(forced_logouts(&published), 0);
    assert!(notices(&published).is_empty());
}

#[tokio::test]
async fn test_refresh_failure_expires_session() {
    let server = setup_mock_server().await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/t1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let session = logged_in_session(&server, "old").await;
    let mut events = session.client().events().subscribe();

    let err = session.client().delete_task("t1").await.unwrap_err();

    assert!(err.is_auth_error());
    assert_eq!(session.client().access_token(), None);
    let published = drain(&mut events);
    assert_eq!(forced_logouts(&published), 1);
    assert_eq!(notices(&published), vec![SESSION_EXPIRED_NOTICE.to_string()]);

    let cleared = eventually(|| !session.is_authenticated()).await;
    assert!(cleared, "session survived a forced logout");
    assert!(!session.auto_refresh_armed());
}

#[tokio::test]
async fn test_server_error_notice_uses_backend_message() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(500).set_body_json(message_body("Database unavailable")))
        .mount(&server)
        .await;
    let session = logged_in_session(&server, "tok").await;
    let mut events = session.client().events().subscribe();

    let err = session.client().create_task("hello").await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(notices(&drain(&mut events)), vec!["Database unavailable".to_string()]);
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_server_error_without_message_uses_status_text() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let client = client_for(&server);
    let mut events = client.events().subscribe();

    let err = client.get_task("missing").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(
        notices(&drain(&mut events)),
        vec!["Request failed with status code 404".to_string()]
    );
}

#[tokio::test]
async fn test_transport_failure_publishes_notice() {
    // Nothing listens on port 1.
    let config = ClientConfig::default().with_base_url("http://127.0.0.1:1");
    let client = assert_ok!(TaskpadClient::with_config(config));
    let mut events = client.events().subscribe();

    let err = client.health().await.unwrap_err();

    assert!(matches!(err, TaskpadError::Http(_)));
    let messages = notices(&drain(&mut events));
    assert_eq!(messages.len(), 1);
    assert!(!messages[0].is_empty());
}

#[tokio::test]
async fn test_unauthenticated_request_has_no_bearer() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "ok" })))
        .mount(&server)
        .await;
    let client = client_for(&server);

    let body = client.health().await.unwrap();
    assert_eq!(body["status"], "ok");

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}
