//! Shared harness for the HTTP level tests.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use vidshare::api::AppState;
use vidshare::config::Config;
use vidshare::domain::{ManualClock, SeededRandom};
use vidshare::state::SharedState;

pub const ADMIN_PASSWORD: &str = "admin123";
const BOUNDARY: &str = "vidshare-test-boundary";

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
    pub clock: ManualClock,
    pub upload_dir: tempfile::TempDir,
}

pub fn test_config(upload_dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.storage.upload_path = upload_dir.path().display().to_string();
    config.server.secure_cookies = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

pub async fn spawn_app() -> TestApp {
    let upload_dir = tempfile::tempdir().expect("failed to create upload dir");
    let config = test_config(&upload_dir);

    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
    let shared = SharedState::with_sources(
        config,
        Arc::new(clock.clone()),
        Arc::new(SeededRandom::new(42)),
    )
    .await
    .expect("failed to create shared state");
    vidshare::bootstrap(&shared).await.expect("bootstrap failed");

    let state = vidshare::api::create_app_state(Arc::new(shared), None);
    let router = vidshare::api::router(state.clone()).await;

    TestApp {
        state,
        router,
        clock,
        upload_dir,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: &Value,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn send_empty(&self, method: &str, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Logs in and returns the `Cookie` header value for the new session.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .send_json(
                "POST",
                "/api/auth/login",
                None,
                &serde_json::json!({ "username": username, "password": password }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "login failed");

        response
            .headers()
            .get(header::SET_COOKIE)
            .expect("login did not set a cookie")
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string()
    }

    pub async fn admin_cookie(&self) -> String {
        self.login("admin", ADMIN_PASSWORD).await
    }

    /// Uploads a small fake video and returns the `data` of the response.
    pub async fn upload(&self, cookie: &str, title: &str, filename: &str, is_public: bool) -> Value {
        let response = self
            .upload_raw(cookie, title, filename, Some(is_public), b"fake video bytes")
            .await;
        assert_eq!(response.status(), StatusCode::OK, "upload failed");
        body_json(response).await["data"].clone()
    }

    pub async fn upload_raw(
        &self,
        cookie: &str,
        title: &str,
        filename: &str,
        is_public: Option<bool>,
        data: &[u8],
    ) -> Response<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\n{title}\r\n"
            )
            .as_bytes(),
        );
        if let Some(is_public) = is_public {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"is_public\"\r\n\r\n{is_public}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/api/admin/videos")
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Names of the files in the upload directory, sorted. Directories are skipped.
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.upload_dir.path())
            .unwrap()
            .map(Result::unwrap)
            .filter(|e| e.file_type().unwrap().is_file())
            .map(|e| e.file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}
