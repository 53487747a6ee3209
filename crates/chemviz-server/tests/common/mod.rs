//! Common test utilities for chemviz server integration tests
//!
//! Each [`TestApp`] gets its own in-memory SQLite database and a temporary
//! media root, so tests never share state.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chemviz_server::{
    api::{self, AppState},
    config::Config,
};
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;
use tower::ServiceExt;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "test-password";

const BOUNDARY: &str = "chemviz-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub media: TempDir,
}

impl TestApp {
    pub async fn start() -> Self {
        let media = tempfile::tempdir().expect("Failed to create media dir");

        let mut config = Config::default();
        config.auth.password = PASSWORD.to_string();
        config.media.root = media.path().to_path_buf();
        config.validate().expect("Test config must be valid");

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");
        chemviz_server::db::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let state = AppState::new(&config, pool).await.expect("Failed to build state");
        let router = api::create_router(state.clone(), &config);

        Self {
            router,
            state,
            media,
        }
    }

    /// Obtain a fresh access token for the configured account
    pub async fn access_token(&self) -> String {
        let pair = self.state.tokens.issue(USERNAME, PASSWORD).await.unwrap();
        pair.access
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> (StatusCode, String) {
        let request = Request::builder()
            .uri(uri)
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// POST a multipart body with a single part named `field_name`
    pub async fn upload(
        &self,
        token: &str,
        field_name: &str,
        file_name: &str,
        content: &str,
    ) -> (StatusCode, String) {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file}\"\r\n\
             Content-Type: text/csv\r\n\r\n{content}\r\n--{b}--\r\n",
            b = BOUNDARY,
            field = field_name,
            file = file_name,
            content = content,
        );

        let request = Request::builder()
            .uri("/api/upload/")
            .method("POST")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Invalid JSON body {:?}: {}", body, e))
}
