//! End-to-end tests for notifications
//!
//! Status changes are stored as notifications and pushed to the candidate's
//! open websocket connections.

mod common;

use common::{created_id, TestClient, TestServer, WS_RECEIVE_TIMEOUT_MS};
use futures::{SinkExt, StreamExt};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn connect_ws(server: &TestServer, client: &TestClient) -> WsStream {
    let token = client.access_token().expect("client is not signed in");
    let (ws_stream, _) = connect_async(server.ws_url(&token))
        .await
        .expect("Failed to connect to WebSocket");
    ws_stream
}

/// Wait for a specific message type, timing out after duration
async fn wait_for_message(ws: &mut WsStream, expected_type: &str) -> Option<Value> {
    let result = timeout(Duration::from_millis(WS_RECEIVE_TIMEOUT_MS), async {
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                if let Ok(json) = serde_json::from_str::<Value>(&text) {
                    if json.get("type").and_then(|t| t.as_str()) == Some(expected_type) {
                        return Some(json);
                    }
                }
            }
        }
        None
    })
    .await;

    result.ok().flatten()
}

/// A published job with one application: (recruiter, candidate, resume id)
async fn application(server: &TestServer) -> (TestClient, TestClient, i64) {
    let admin = TestClient::authenticated_admin(server.base_url.clone()).await;
    let (recruiter, _) =
        TestClient::new_recruiter(server.base_url.clone(), "Rita", "rita@acme.test", "Acme")
            .await;
    let job_id = created_id(recruiter.create_job("Backend Engineer", 1, &[]).await).await;
    admin.approve_job(job_id).await;
    let candidate =
        TestClient::new_candidate(server.base_url.clone(), "Carl", "carl@mail.test").await;
    let resume_id = created_id(candidate.apply(job_id).await).await;
    (recruiter, candidate, resume_id)
}

#[tokio::test]
async fn test_websocket_requires_token() {
    let server = TestServer::spawn().await;

    let result = connect_async(format!("ws://127.0.0.1:{}/ws", server.port)).await;
    assert!(result.is_err());

    let result = connect_async(server.ws_url("garbage")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_websocket_connected_and_ping() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated_admin(server.base_url.clone()).await;
    let mut ws = connect_ws(&server, &client).await;

    let connected = wait_for_message(&mut ws, "connected")
        .await
        .expect("No connected message");
    assert!(connected["payload"]["connection_id"].as_u64().is_some());

    ws.send(Message::Text(r#"{"type":"ping"}"#.into()))
        .await
        .unwrap();
    assert!(wait_for_message(&mut ws, "pong").await.is_some());

    ws.send(Message::Text("not json".into())).await.unwrap();
    let error = wait_for_message(&mut ws, "error")
        .await
        .expect("No error message");
    assert_eq!(error["payload"]["code"], "parse_error");
}

#[tokio::test]
async fn test_status_change_is_pushed_to_candidate() {
    let server = TestServer::spawn().await;
    let (recruiter, candidate, resume_id) = application(&server).await;
    let mut ws = connect_ws(&server, &candidate).await;
    assert!(wait_for_message(&mut ws, "connected").await.is_some());

    let response = recruiter.set_resume_status(resume_id, "APPROVED").await;
    assert_eq!(response.status(), StatusCode::OK);

    let pushed = wait_for_message(&mut ws, "notification")
        .await
        .expect("No notification pushed");
    assert_eq!(pushed["payload"]["notification_type"], "APPROVED");
    assert_eq!(pushed["payload"]["resume_id"], resume_id);
    assert_eq!(pushed["payload"]["job_name"], "Backend Engineer");
    assert_eq!(pushed["payload"]["company_name"], "Acme");
    assert_eq!(pushed["payload"]["read"], false);
}

#[tokio::test]
async fn test_other_users_do_not_receive_notifications() {
    let server = TestServer::spawn().await;
    let (recruiter, _candidate, resume_id) = application(&server).await;
    let bystander =
        TestClient::new_candidate(server.base_url.clone(), "Dana", "dana@mail.test").await;
    let mut ws = connect_ws(&server, &bystander).await;
    assert!(wait_for_message(&mut ws, "connected").await.is_some());

    recruiter.set_resume_status(resume_id, "REJECTED").await;

    assert!(wait_for_message(&mut ws, "notification").await.is_none());
}

#[tokio::test]
async fn test_unread_notifications_and_mark_as_read() {
    let server = TestServer::spawn().await;
    let (recruiter, candidate, resume_id) = application(&server).await;

    recruiter.set_resume_status(resume_id, "REVIEWING").await;
    recruiter.set_resume_status(resume_id, "APPROVED").await;

    let response = candidate.unread_notifications().await;
    assert_eq!(response.status(), StatusCode::OK);
    let unread: Vec<Value> = response.json().await.unwrap();
    assert_eq!(unread.len(), 2);

    let response = candidate
        .post("/notifications/mark-as-read", serde_json::json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["updated"], 2);

    let unread: Vec<Value> = candidate.unread_notifications().await.json().await.unwrap();
    assert!(unread.is_empty());

    // The recruiter has no notifications of their own
    let unread: Vec<Value> = recruiter.unread_notifications().await.json().await.unwrap();
    assert!(unread.is_empty());
}
