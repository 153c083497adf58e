//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use tresser::models::AppConfig;
use tresser::server::{build_router, create_app_state, AppState};
use tresser::services::InMemoryJobStore;

/// Test application with router and direct access to services
pub struct TestApp {
    router: axum::Router,
    pub jobs: Arc<InMemoryJobStore>,
}

impl TestApp {
    /// Create a new test application with default configuration
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create a test application with a custom configuration
    pub fn with_config(mut config: AppConfig) -> Self {
        // Short steps keep tests snappy
        config.filter.step_budget_ms = 2;
        let state = create_app_state(&config);
        let jobs = state.jobs.clone();
        let router = build_router(state);
        Self { router, jobs }
    }

    /// Create application state for custom router configuration
    pub fn create_state() -> AppState {
        create_app_state(&AppConfig::default())
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request with a raw body
    pub async fn post_bytes(&self, path: &str, body: Vec<u8>) -> TestResponse {
        self.request(
            Request::post(path)
                .header("Content-Type", "application/octet-stream")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request(Request::delete(path).body(Body::empty()).unwrap())
            .await
    }

    /// Submit an image and return the job id
    pub async fn submit(&self, query: &str, png: Vec<u8>) -> String {
        let response = self.post_bytes(&format!("/api/jobs{query}"), png).await;
        assert_eq!(
            response.status,
            StatusCode::ACCEPTED,
            "Submit failed: {}",
            response.text()
        );
        let json: serde_json::Value = response.json();
        json["id"].as_str().unwrap().to_string()
    }

    /// Poll job status until it reports complete
    pub async fn wait_for_completion(&self, id: &str) -> serde_json::Value {
        for _ in 0..5000 {
            let response = self.get(&format!("/api/jobs/{id}")).await;
            assert_eq!(response.status, StatusCode::OK);
            let json: serde_json::Value = response.json();
            if json["status"] == "complete" {
                return json;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("Job {id} did not complete");
    }

    /// Send a request to the router
    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Get raw body bytes
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Check if response is a PNG image
    pub fn is_png(&self) -> bool {
        self.body.len() >= 8 && &self.body[0..8] == b"\x89PNG\r\n\x1a\n"
    }
}
