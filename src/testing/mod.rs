use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use crate::auth::{ApiKeyGate, API_KEY_HEADER};
use crate::config::SecurityConfig;
use crate::database::InMemoryTaskStore;
use crate::{app, AppState};

pub const TEST_API_KEY: &str = "test-api-key";

/// Full router over a fresh in-memory store, driven in-process
pub struct TestApp {
    pub store: InMemoryTaskStore,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let store = InMemoryTaskStore::new();
        let state = AppState::new(Arc::new(store.clone()), ApiKeyGate::new(TEST_API_KEY));
        let security = SecurityConfig {
            api_key: TEST_API_KEY.to_string(),
            enable_cors: false,
            cors_origins: Vec::new(),
        };
        Self {
            store,
            router: app(state, &security),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        api_key: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("valid test request"))
            .await
            .expect("router is infallible")
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn each_test_app_has_its_own_store() {
        let first = TestApp::new();
        let second = TestApp::new();
        first
            .request(
                Method::POST,
                "/tasks",
                Some(TEST_API_KEY),
                Some(serde_json::json!({ "title": "only in first" })),
            )
            .await;

        let response = second.request(Method::GET, "/tasks", Some(TEST_API_KEY), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }
}
