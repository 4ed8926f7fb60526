//! Common test utilities for integration tests
//!
//! Builds the full router over an in-memory store with two provisioned users
//! and a signed bearer token for each, then drives it request by request.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use taskboard_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskboard_shared::{
    auth::jwt::{create_token, Claims},
    store::memory::InMemoryStore,
};
use tower::Service as _;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-chars";

/// A registered user and their bearer token
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestUser {
    fn new() -> anyhow::Result<Self> {
        let id = Uuid::new_v4();
        let token = create_token(&Claims::new(id), JWT_SECRET)?;
        Ok(Self { id, token })
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub app: Router,
    pub alice: TestUser,
    pub bob: TestUser,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgresql://unused/taskboard_test".to_string()),
            "JWT_SECRET" => Some(JWT_SECRET.to_string()),
            _ => None,
        })?;

        let store = Arc::new(InMemoryStore::new());
        let alice = TestUser::new()?;
        let bob = TestUser::new()?;
        store.add_user(alice.id).await;
        store.add_user(bob.id).await;

        let app = build_router(AppState::new(store.clone(), config));

        Ok(Self {
            store,
            app,
            alice,
            bob,
        })
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// Empty bodies come back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, body)
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(&user.token), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(&user.token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(&user.token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(&user.token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(&user.token), None).await
    }

    /// Creates a label through the API and returns its ID
    pub async fn create_label(&self, user: &TestUser, name: &str) -> i64 {
        let (status, body) = self
            .post("/api/labels/", user, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "label create failed: {}", body);
        body["id"].as_i64().unwrap()
    }

    /// Creates a task through the API and returns its body
    pub async fn create_task(&self, user: &TestUser, body: Value) -> Value {
        let (status, body) = self.post("/api/tasks/", user, body).await;
        assert_eq!(status, StatusCode::CREATED, "task create failed: {}", body);
        body
    }
}

/// Extracts the first validation detail code from an error body
pub fn first_detail_code(body: &Value) -> &str {
    body["details"][0]["code"].as_str().unwrap_or_default()
}
