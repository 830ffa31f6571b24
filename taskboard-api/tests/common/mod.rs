//! Common test utilities for API integration tests
//!
//! Builds the full router over an in-memory store, so these tests need no
//! database:
//! - Test configuration with cheap password hashing
//! - User signup helper returning a bearer token
//! - JSON request helper driving the router with `oneshot`

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use taskboard_api::{
    app::{build_router, AppState},
    config::{ApiConfig, AuthzConfig, Config, JwtConfig, StorageBackend},
};
use taskboard_shared::{auth::password::HashParams, store::memory::MemoryStore};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test configuration; `enforce_ownership` toggles project ownership checks
pub fn test_config(enforce_ownership: bool) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["http://localhost:5173".to_string()],
        },
        storage: StorageBackend::Memory,
        database: None,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            expiration_days: 7,
        },
        password: HashParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        authz: AuthzConfig {
            enforce_project_ownership: enforce_ownership,
        },
    }
}

/// Response status and parsed JSON body (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Test context containing the router and a signed-up user
pub struct TestContext {
    pub app: Router,
    pub token: String,
    pub user_id: Uuid,
}

impl TestContext {
    /// Fresh in-memory app with one registered user
    pub async fn new() -> Self {
        Self::with_config(test_config(false)).await
    }

    pub async fn with_config(config: Config) -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        let app = build_router(state);

        let mut ctx = TestContext {
            app,
            token: String::new(),
            user_id: Uuid::nil(),
        };

        let (token, user_id) = ctx.signup("Test User", "test@example.com", "password123").await;
        ctx.token = token;
        ctx.user_id = user_id;
        ctx
    }

    /// Registers a user and returns its token and id
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> (String, Uuid) {
        let response = self
            .send(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({ "name": name, "email": email, "password": password })),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK, "signup failed: {}", response.body);

        let token = response.body["token"].as_str().unwrap().to_string();
        let user_id = response.body["user"]["id"].as_str().unwrap().parse().unwrap();
        (token, user_id)
    }

    /// Sends a request, optionally authenticated and with a JSON body
    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = self.app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }

    /// Sends a request as the context's user
    pub async fn authed(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        self.send(method, uri, Some(&self.token), body).await
    }

    /// Creates a project and returns its id
    pub async fn create_project(&self, title: &str) -> String {
        let response = self
            .authed(
                Method::POST,
                "/project",
                Some(json!({ "title": title, "description": "Test project" })),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK, "create project failed: {}", response.body);
        response.body["id"].as_str().unwrap().to_string()
    }

    /// Adds a task and returns its id
    pub async fn create_task(&self, project_id: &str, title: &str) -> String {
        let response = self
            .authed(
                Method::POST,
                &format!("/project/{}/task", project_id),
                Some(json!({ "title": title, "description": "Test task" })),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK, "create task failed: {}", response.body);
        response.body["task"]["id"].as_str().unwrap().to_string()
    }

    /// Fetches a project's tasks
    pub async fn tasks(&self, project_id: &str) -> Vec<Value> {
        let response = self.authed(Method::GET, &format!("/project/{}", project_id), None).await;
        assert_eq!(response.status, StatusCode::OK);
        response.body[0]["tasks"].as_array().unwrap().clone()
    }
}

/// `(stage, order)` of one task in a task list
pub fn placement_of(tasks: &[Value], task_id: &str) -> (String, i64) {
    let task = tasks
        .iter()
        .find(|t| t["id"] == task_id)
        .unwrap_or_else(|| panic!("task {} not found", task_id));

    (task["stage"].as_str().unwrap().to_string(), task["order"].as_i64().unwrap())
}
