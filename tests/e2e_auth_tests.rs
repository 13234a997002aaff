//! End-to-end tests for authentication endpoints
//!
//! Tests login, token refresh, logout, registration and authentication
//! requirements.

mod common;

use common::{TestClient, TestServer, ADMIN_EMAIL, ADMIN_PASS, TEST_PASS};
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn test_login_with_valid_credentials() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login(ADMIN_EMAIL, ADMIN_PASS).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert!(body["access_token"].as_str().is_some());
    assert_eq!(body["user"]["email"], ADMIN_EMAIL);
    assert_eq!(body["user"]["role"], "ADMIN");
}

#[tokio::test]
async fn test_login_with_invalid_password() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login(ADMIN_EMAIL, "wrong_password").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(client.access_token().is_none());
}

#[tokio::test]
async fn test_login_with_nonexistent_user() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.login("nobody@jobhunter.test", "password").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_endpoint_requires_authentication() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.account().await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_account_returns_signed_in_user() {
    let server = TestServer::spawn().await;
    let client =
        TestClient::new_candidate(server.base_url.clone(), "Ada", "ada@jobhunter.test").await;

    let response = client.account().await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], "ada@jobhunter.test");
    assert_eq!(body["user"]["role"], "CANDIDATE");
}

#[tokio::test]
async fn test_refresh_issues_new_access_token() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated_admin(server.base_url.clone()).await;

    // Forget the access token; the refresh cookie alone must be enough
    client.set_access_token(None);
    assert_eq!(client.account().await.status(), StatusCode::UNAUTHORIZED);

    let response = client.refresh().await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(client.access_token().is_some());

    assert_eq!(client.account().await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_without_cookie_is_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.refresh().await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_revokes_refresh_token() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated_admin(server.base_url.clone()).await;

    let response = client.logout().await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.refresh().await;
    assert_ne!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_requires_authentication() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.logout().await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .register("Ada", "ada@jobhunter.test", TEST_PASS)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .register("Another Ada", "ada@jobhunter.test", TEST_PASS)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_validates_input() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.register("Ada", "not-an-email", TEST_PASS).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.register("Ada", "ada@jobhunter.test", "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_registered_user_never_gets_admin_role() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .post(
            "/auth/register",
            serde_json::json!({
                "name": "Mallory",
                "email": "mallory@jobhunter.test",
                "password": TEST_PASS,
                "role": "ADMIN",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["role"], "CANDIDATE");
}

#[tokio::test]
async fn test_register_recruiter_creates_company() {
    let server = TestServer::spawn().await;
    let (recruiter, company_id) = TestClient::new_recruiter(
        server.base_url.clone(),
        "Rita",
        "rita@acme.test",
        "Acme",
    )
    .await;

    let response = recruiter.get(&format!("/companies/{}", company_id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Acme");

    let body: Value = recruiter.account().await.json().await.unwrap();
    assert_eq!(body["user"]["role"], "RECRUITER");
    assert_eq!(body["user"]["company_id"], company_id);
}

#[tokio::test]
async fn test_google_login_disabled_without_verifier() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .post(
            "/auth/oauth2-login",
            serde_json::json!({ "credential": "some-id-token" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post("/auth/oauth2-login", serde_json::json!({ "credential": "" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
