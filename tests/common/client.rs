//! HTTP client for end-to-end tests
//!
//! This module wraps reqwest and provides methods for the server endpoints.
//! The refresh token lives in the cookie store; the access token is kept
//! here and sent as a bearer header.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Mutex;
use std::time::Duration;

/// HTTP test client with bearer token and refresh cookie handling
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
    access_token: Mutex<Option<String>>,
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            base_url,
            access_token: Mutex::new(None),
        }
    }

    /// Creates a client signed in as the seeded admin
    pub async fn authenticated_admin(base_url: String) -> Self {
        Self::authenticated(base_url, ADMIN_EMAIL, ADMIN_PASS).await
    }

    /// Creates a client signed in with the given credentials
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String, email: &str, password: &str) -> Self {
        let client = Self::new(base_url);
        let response = client.login(email, password).await;
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "Authentication of {} failed: {:?}",
            email,
            response.text().await
        );
        client
    }

    /// Registers a candidate account and returns a client signed in as it
    pub async fn new_candidate(base_url: String, name: &str, email: &str) -> Self {
        let client = Self::new(base_url);
        let response = client.register(name, email, TEST_PASS).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let response = client.login(email, TEST_PASS).await;
        assert_eq!(response.status(), StatusCode::OK);
        client
    }

    /// Registers a recruiter together with their company and returns a
    /// signed-in client plus the new company id
    pub async fn new_recruiter(
        base_url: String,
        name: &str,
        email: &str,
        company_name: &str,
    ) -> (Self, i64) {
        let client = Self::new(base_url);
        let response = client
            .register_recruiter(name, email, TEST_PASS, company_name)
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        let company_id = body["company"]["id"].as_i64().expect("company id");
        let response = client.login(email, TEST_PASS).await;
        assert_eq!(response.status(), StatusCode::OK);
        (client, company_id)
    }

    /// The current access token, if signed in
    pub fn access_token(&self) -> Option<String> {
        self.access_token.lock().unwrap().clone()
    }

    pub fn set_access_token(&self, token: Option<String>) {
        *self.access_token.lock().unwrap() = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get(&self, path: &str) -> Response {
        self.with_auth(self.client.get(self.url(path)))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post(&self, path: &str, body: Value) -> Response {
        self.with_auth(self.client.post(self.url(path)))
            .json(&body)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn put(&self, path: &str, body: Value) -> Response {
        self.with_auth(self.client.put(self.url(path)))
            .json(&body)
            .send()
            .await
            .expect("PUT request failed")
    }

    pub async fn put_empty(&self, path: &str) -> Response {
        self.with_auth(self.client.put(self.url(path)))
            .send()
            .await
            .expect("PUT request failed")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.with_auth(self.client.delete(self.url(path)))
            .send()
            .await
            .expect("DELETE request failed")
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// Stores the access token of a successful sign-in or refresh
    async fn keep_token(&self, response: Response) -> Response {
        if response.status() != StatusCode::OK {
            return response;
        }
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await.expect("Failed to read body");
        if let Ok(body) = serde_json::from_slice::<Value>(&bytes) {
            if let Some(token) = body["access_token"].as_str() {
                self.set_access_token(Some(token.to_string()));
            }
        }
        let mut builder = http::Response::builder().status(status);
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        Response::from(builder.body(bytes).expect("Failed to rebuild response"))
    }

    /// POST /auth/login
    pub async fn login(&self, email: &str, password: &str) -> Response {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": email, "password": password }))
            .send()
            .await
            .expect("Login request failed");
        self.keep_token(response).await
    }

    /// GET /auth/refresh, using the refresh cookie
    pub async fn refresh(&self) -> Response {
        let response = self
            .client
            .get(self.url("/auth/refresh"))
            .send()
            .await
            .expect("Refresh request failed");
        self.keep_token(response).await
    }

    /// POST /auth/logout
    pub async fn logout(&self) -> Response {
        self.with_auth(self.client.post(self.url("/auth/logout")))
            .send()
            .await
            .expect("Logout request failed")
    }

    /// GET /auth/account
    pub async fn account(&self) -> Response {
        self.get("/auth/account").await
    }

    /// POST /auth/register
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/auth/register"))
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await
            .expect("Register request failed")
    }

    /// POST /auth/register-recruiter
    pub async fn register_recruiter(
        &self,
        name: &str,
        email: &str,
        password: &str,
        company_name: &str,
    ) -> Response {
        self.client
            .post(self.url("/auth/register-recruiter"))
            .json(&json!({
                "name": name,
                "email": email,
                "password": password,
                "company_name": company_name,
            }))
            .send()
            .await
            .expect("Register recruiter request failed")
    }

    // ========================================================================
    // Catalog Endpoints
    // ========================================================================

    /// POST /companies
    pub async fn create_company(&self, name: &str) -> Response {
        self.post("/companies", json!({ "name": name })).await
    }

    /// POST /skills
    pub async fn create_skill(&self, name: &str) -> Response {
        self.post("/skills", json!({ "name": name })).await
    }

    /// POST /jobs with a one-year window starting now
    pub async fn create_job(&self, name: &str, quantity: i64, skill_ids: &[i64]) -> Response {
        let now = chrono::Utc::now().timestamp();
        self.create_job_with(json!({
            "name": name,
            "location": "Remote",
            "salary": 1000.0,
            "quantity": quantity,
            "level": "JUNIOR",
            "start_date": now,
            "end_date": now + 365 * 86_400,
            "skill_ids": skill_ids,
        }))
        .await
    }

    /// POST /jobs with a raw body
    pub async fn create_job_with(&self, body: Value) -> Response {
        self.post("/jobs", body).await
    }

    /// PUT /jobs/{id}/approve
    pub async fn approve_job(&self, id: i64) -> Response {
        self.put_empty(&format!("/jobs/{}/approve", id)).await
    }

    /// GET /jobs/{id}
    pub async fn get_job(&self, id: i64) -> Response {
        self.get(&format!("/jobs/{}", id)).await
    }

    // ========================================================================
    // Hiring Workflow Endpoints
    // ========================================================================

    /// POST /resumes
    pub async fn apply(&self, job_id: i64) -> Response {
        self.post(
            "/resumes",
            json!({ "job_id": job_id, "url": "http://files.test/cv.pdf" }),
        )
        .await
    }

    /// PUT /resumes
    pub async fn set_resume_status(&self, id: i64, status: &str) -> Response {
        self.put("/resumes", json!({ "id": id, "status": status }))
            .await
    }

    /// GET /resumes/{id}
    pub async fn get_resume(&self, id: i64) -> Response {
        self.get(&format!("/resumes/{}", id)).await
    }

    /// PUT /resumes/{id}/confirm
    pub async fn confirm_interview(&self, id: i64) -> Response {
        self.put_empty(&format!("/resumes/{}/confirm", id)).await
    }

    /// GET /notifications/unread
    pub async fn unread_notifications(&self) -> Response {
        self.get("/notifications/unread").await
    }

    // ========================================================================
    // Admin Endpoints
    // ========================================================================

    /// POST /admin/jobs/{id}/trigger
    pub async fn trigger_job(&self, job_id: &str) -> Response {
        self.with_auth(
            self.client
                .post(self.url(&format!("/admin/jobs/{}/trigger", job_id))),
        )
        .send()
        .await
        .expect("Trigger request failed")
    }
}

/// Reads the `id` of a created entity
pub async fn created_id(response: Response) -> i64 {
    assert_eq!(
        response.status(),
        StatusCode::CREATED,
        "Unexpected status creating entity"
    );
    let body: Value = response.json().await.expect("Invalid JSON body");
    body["id"].as_i64().expect("Missing id")
}
