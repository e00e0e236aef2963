#![allow(dead_code)]

// Shared helpers for the HTTP integration tests. Each test gets its own
// temporary SQLite database and server on an ephemeral port, so tests
// are independent and need no external infrastructure.

use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use courier_server::config::Config;
use courier_server::context::AppContext;
use courier_server::{db, routes};

pub const TEST_PASSWORD: &str = "test-password-123";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    _db_dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let db_dir = tempfile::tempdir().expect("failed to create temp dir");
    let db_path = db_dir.path().join("courier-test.db");
    let database_url = format!("sqlite://{}", db_path.display());

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "integration-test-secret-0123456789abcdef".to_string(),
        // Lowest legal cost keeps the suite fast
        bcrypt_cost: 4,
        port: 0,
        token_ttl_hours: None,
        rust_log: "info".to_string(),
    };

    let pool = db::create_pool(&database_url)
        .await
        .expect("failed to create pool");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let app_context = Arc::new(AppContext::new(pool, config));
    let app = routes::create_router(app_context);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let address = format!("127.0.0.1:{}", listener.local_addr().unwrap().port());

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server error");
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
        _db_dir: db_dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.address, path)
    }

    /// Register a user with the standard test password, returning the
    /// session token
    pub async fn register(&self, username: &str) -> String {
        let response = self
            .client
            .post(self.url("/register"))
            .json(&json!({
                "username": username,
                "password": TEST_PASSWORD,
                "first_name": "Test",
                "last_name": "User",
                "phone": "+15550000000",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Send a message, returning its id
    pub async fn send_message(&self, token: &str, to_username: &str, body: &str) -> i64 {
        let response = self
            .client
            .post(self.url("/messages"))
            .bearer_auth(token)
            .json(&json!({ "to_username": to_username, "body": body }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);

        let body: Value = response.json().await.unwrap();
        body["message"]["id"].as_i64().unwrap()
    }

    pub async fn get_json(&self, token: &str, path: &str) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        let status = response.status();
        let body = response.json().await.unwrap();
        (status, body)
    }

    pub async fn post_json(&self, token: &str, path: &str, body: Value) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status();
        let body = response.json().await.unwrap();
        (status, body)
    }

    /// Mark a message read, returning (status, body)
    pub async fn mark_read(&self, token: &str, id: i64) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .post(self.url(&format!("/messages/{}/read", id)))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        let status = response.status();
        let body = response.json().await.unwrap();
        (status, body)
    }
}

/// Assert the standard failure body shape and return the error message
pub fn assert_error_body(body: &Value, expected_code: &str, expected_status: u16) -> String {
    assert_eq!(body["error"]["code"], expected_code, "body: {}", body);
    assert_eq!(
        body["error"]["status"], expected_status,
        "body: {}",
        body
    );
    body["error"]["message"].as_str().unwrap().to_string()
}
