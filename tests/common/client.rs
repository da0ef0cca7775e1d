//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per endpoint. When API routes or request
//! formats change, update only this file.

use super::constants::*;
use reqwest::{multipart, Response, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

/// Splits a response into its status and parsed envelope.
pub async fn envelope(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let body = response
        .json::<Value>()
        .await
        .expect("Response is not a JSON envelope");
    assert_eq!(
        body["status"].as_u64(),
        Some(status.as_u16() as u64),
        "Envelope status differs from HTTP status: {}",
        body
    );
    (status, body)
}

/// The envelope's `data`, asserting a 2xx status.
pub async fn data(response: Response) -> Value {
    let (status, body) = envelope(response).await;
    assert!(status.is_success(), "Unexpected failure {}: {}", status, body);
    body["data"].clone()
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client logged in with the given credentials.
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String, handle: &str, password: &str) -> Self {
        let client = Self::new(base_url);
        let response = client.login(handle, password).await;
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "Authentication of {} failed: {:?}",
            handle,
            response.text().await
        );
        client
    }

    pub async fn authenticated_alice(base_url: String) -> Self {
        Self::authenticated(base_url, ALICE_USER, ALICE_PASS).await
    }

    pub async fn authenticated_bob(base_url: String) -> Self {
        Self::authenticated(base_url, BOB_USER, BOB_PASS).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Response {
        request.send().await.expect("Request failed")
    }

    pub async fn get(&self, path: &str) -> Response {
        self.send(self.client.get(self.url(path))).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> Response {
        self.send(self.client.post(self.url(path)).json(&body)).await
    }

    pub async fn post_empty(&self, path: &str) -> Response {
        self.send(self.client.post(self.url(path))).await
    }

    pub async fn patch_json(&self, path: &str, body: Value) -> Response {
        self.send(self.client.patch(self.url(path)).json(&body)).await
    }

    pub async fn patch_empty(&self, path: &str) -> Response {
        self.send(self.client.patch(self.url(path))).await
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.send(self.client.delete(self.url(path))).await
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/register
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> Response {
        self.post_json(
            "/auth/register",
            json!({
                "username": username,
                "email": email,
                "full_name": full_name,
                "password": password,
            }),
        )
        .await
    }

    /// POST /v1/auth/login, by username
    pub async fn login(&self, handle: &str, password: &str) -> Response {
        self.post_json(
            "/auth/login",
            json!({ "username": handle, "password": password }),
        )
        .await
    }

    /// POST /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.post_empty("/auth/logout").await
    }

    /// POST /v1/auth/refresh, with the token in the body
    pub async fn refresh_with(&self, refresh_token: &str) -> Response {
        self.post_json(
            "/auth/refresh",
            json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    /// POST /v1/auth/refresh, relying on the refresh cookie
    pub async fn refresh_from_cookie(&self) -> Response {
        self.post_empty("/auth/refresh").await
    }

    /// GET /v1/users/me with an explicit bearer token and no cookies.
    pub async fn me_with_bearer(&self, access_token: &str) -> Response {
        let bare = reqwest::Client::new();
        bare.get(self.url("/users/me"))
            .bearer_auth(access_token)
            .send()
            .await
            .expect("Request failed")
    }

    // ========================================================================
    // Videos
    // ========================================================================

    /// POST /v1/videos with an mp4 and an optional png thumbnail
    pub async fn upload_video(&self, title: &str, with_thumbnail: bool) -> Response {
        let video = multipart::Part::bytes(MP4_BYTES.to_vec())
            .file_name("clip.mp4")
            .mime_str("video/mp4")
            .expect("Invalid mime");
        let mut form = multipart::Form::new()
            .text("title", title.to_string())
            .text("description", format!("{} description", title))
            .part("video", video);
        if with_thumbnail {
            let thumbnail = multipart::Part::bytes(PNG_BYTES.to_vec())
                .file_name("thumb.png")
                .mime_str("image/png")
                .expect("Invalid mime");
            form = form.part("thumbnail", thumbnail);
        }
        self.send(self.client.post(self.url("/videos")).multipart(form))
            .await
    }

    /// Uploads a video and returns its id.
    pub async fn create_video(&self, title: &str) -> String {
        let video = data(self.upload_video(title, false).await).await;
        video["id"].as_str().expect("Video without id").to_string()
    }

    /// GET /v1/videos?<query>
    pub async fn list_videos(&self, query: &str) -> Response {
        self.get(&format!("/videos?{}", query)).await
    }

    // ========================================================================
    // Comments, tweets, playlists
    // ========================================================================

    pub async fn add_comment(&self, video_id: &str, content: &str) -> Response {
        self.post_json(
            &format!("/videos/{}/comments", video_id),
            json!({ "content": content }),
        )
        .await
    }

    pub async fn create_tweet(&self, content: &str) -> Response {
        self.post_json("/tweets", json!({ "content": content }))
            .await
    }

    pub async fn create_playlist(&self, name: &str, description: &str) -> Response {
        self.post_json(
            "/playlists",
            json!({ "name": name, "description": description }),
        )
        .await
    }

    // ========================================================================
    // Social
    // ========================================================================

    /// POST /v1/{kind}/{id}/like for videos, comments or tweets
    pub async fn toggle_like(&self, kind: &str, id: &str) -> Response {
        self.post_empty(&format!("/{}/{}/like", kind, id)).await
    }

    pub async fn toggle_subscription(&self, channel_id: &str) -> Response {
        self.post_empty(&format!("/channels/{}/subscribe", channel_id))
            .await
    }
}
