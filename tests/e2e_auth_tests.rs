//! End-to-end tests for registration, login and the token lifecycle

mod common;

use common::{data, envelope, TestClient, TestServer, ALICE_EMAIL, ALICE_PASS, ALICE_USER, BOB_EMAIL};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_register_then_login() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .register("Carol", "Carol@Example.com", "Carol C", "carolpass1")
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user = data(response).await;
    assert_eq!(user["username"], "carol");
    assert_eq!(user["email"], "carol@example.com");
    assert!(user.get("password").is_none());

    let response = client.login("carol", "carolpass1").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_duplicate_username_is_conflict() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .register(ALICE_USER, "other@example.com", "Alice Again", "x1234567")
        .await;
    let (status, body) = envelope(response).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn test_register_rejects_blank_and_malformed_fields() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.register("  ", "d@example.com", "D", "pw123456").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.register("dave", "not-an-email", "D", "pw123456").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client.register("da ve", "d@example.com", "D", "pw123456").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failures_are_unauthorized() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let (status, body) = envelope(client.login(ALICE_USER, "wrong-password").await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let response = client.login("nobody", "whatever").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_by_email_sets_cookies() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .post_json(
            "/auth/login",
            json!({ "email": ALICE_EMAIL.to_uppercase(), "password": ALICE_PASS }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookies: Vec<String> = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("access_token=") && c.contains("HttpOnly")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh_token=") && c.contains("HttpOnly")));

    let login = data(response).await;
    assert_eq!(login["user"]["username"], ALICE_USER);
    assert!(login["access_token"].is_string());
    assert!(login["refresh_token"].is_string());

    // The cookie alone authenticates.
    let me = data(client.get("/users/me").await).await;
    assert_eq!(me["id"], server.alice_id.to_string());
}

#[tokio::test]
async fn test_unauthenticated_requests_are_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let (status, body) = envelope(client.get("/users/me").await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let response = client.me_with_bearer("garbage.token.value").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_accepts_access_but_not_refresh_token() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let login = data(client.login(ALICE_USER, ALICE_PASS).await).await;

    let access = login["access_token"].as_str().unwrap();
    let refresh = login["refresh_token"].as_str().unwrap();

    assert_eq!(client.me_with_bearer(access).await.status(), StatusCode::OK);
    assert_eq!(
        client.me_with_bearer(refresh).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_refresh_rotates_and_rejects_old_token() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let login = data(client.login(ALICE_USER, ALICE_PASS).await).await;
    let old_refresh = login["refresh_token"].as_str().unwrap().to_string();

    let rotated = data(client.refresh_with(&old_refresh).await).await;
    let new_refresh = rotated["refresh_token"].as_str().unwrap();
    assert_ne!(new_refresh, old_refresh);

    let response = client.refresh_with(&old_refresh).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client.refresh_with(new_refresh).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_from_cookie() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated_alice(server.base_url.clone()).await;

    let response = client.refresh_from_cookie().await;
    assert_eq!(response.status(), StatusCode::OK);

    // The rotated cookies keep the session usable.
    assert_eq!(client.get("/users/me").await.status(), StatusCode::OK);
    assert_eq!(client.refresh_from_cookie().await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_without_token_is_unauthorized() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.refresh_from_cookie().await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookies_and_refresh_slot() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let login = data(client.login(ALICE_USER, ALICE_PASS).await).await;
    let refresh = login["refresh_token"].as_str().unwrap().to_string();

    assert_eq!(client.logout().await.status(), StatusCode::OK);

    assert_eq!(
        client.get("/users/me").await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        client.refresh_with(&refresh).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_expired_access_token_is_rejected() {
    let server = TestServer::spawn_with_token_ttls(
        std::time::Duration::from_secs(1),
        std::time::Duration::from_secs(3600),
    )
    .await;
    let client = TestClient::new(server.base_url.clone());
    let login = data(client.login(ALICE_USER, ALICE_PASS).await).await;
    let access = login["access_token"].as_str().unwrap().to_string();

    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

    assert_eq!(
        client.me_with_bearer(&access).await.status(),
        StatusCode::UNAUTHORIZED
    );
    // The refresh token still works and yields a fresh access token.
    let rotated = data(client.refresh_from_cookie().await).await;
    let fresh = rotated["access_token"].as_str().unwrap();
    assert_eq!(client.me_with_bearer(fresh).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_account_details() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated_alice(server.base_url.clone()).await;

    let user = data(
        client
            .patch_json("/users/me", json!({ "full_name": "Alice Liddell" }))
            .await,
    )
    .await;
    assert_eq!(user["full_name"], "Alice Liddell");
    assert_eq!(user["email"], ALICE_EMAIL);

    let response = client.patch_json("/users/me", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .patch_json("/users/me", json!({ "email": BOB_EMAIL }))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_change_password() {
    let server = TestServer::spawn().await;
    let client = TestClient::authenticated_alice(server.base_url.clone()).await;

    let response = client
        .post_json(
            "/users/me/password",
            json!({ "old_password": "nope", "new_password": "brand-new-pass" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .post_json(
            "/users/me/password",
            json!({ "old_password": ALICE_PASS, "new_password": "brand-new-pass" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let fresh = TestClient::new(server.base_url.clone());
    assert_eq!(
        fresh.login(ALICE_USER, ALICE_PASS).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        fresh.login(ALICE_USER, "brand-new-pass").await.status(),
        StatusCode::OK
    );
}
