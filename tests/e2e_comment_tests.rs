//! End-to-end tests for video comments

mod common;

use common::{data, envelope, TestClient, TestServer, MISSING_ID};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_comments_list_newest_first_with_pagination() {
    let server = TestServer::spawn().await;
    let alice = TestClient::authenticated_alice(server.base_url.clone()).await;
    let bob = TestClient::authenticated_bob(server.base_url.clone()).await;
    let video = alice.create_video("talk").await;

    let empty = data(alice.get(&format!("/videos/{}/comments", video)).await).await;
    assert!(empty.as_array().unwrap().is_empty());

    for i in 0..3 {
        let response = bob.add_comment(&video, &format!("comment {}", i)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let comments = data(alice.get(&format!("/videos/{}/comments", video)).await).await;
    let comments = comments.as_array().unwrap();
    assert_eq!(comments.len(), 3);
    assert_eq!(comments[0]["content"], "comment 2");
    assert_eq!(comments[0]["owner"]["username"], "bob");

    let page = data(
        alice
            .get(&format!("/videos/{}/comments?page=2&limit=2", video))
            .await,
    )
    .await;
    let page = page.as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["content"], "comment 0");
}

#[tokio::test]
async fn test_comment_on_missing_video_is_not_found() {
    let server = TestServer::spawn().await;
    let bob = TestClient::authenticated_bob(server.base_url.clone()).await;

    assert_eq!(
        bob.add_comment(MISSING_ID, "hello").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        bob.get(&format!("/videos/{}/comments", MISSING_ID))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_blank_comment_is_invalid() {
    let server = TestServer::spawn().await;
    let alice = TestClient::authenticated_alice(server.base_url.clone()).await;
    let video = alice.create_video("talk").await;

    let (status, body) = envelope(alice.add_comment(&video, "   ").await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_argument");
}

#[tokio::test]
async fn test_edit_comment_forbidden_for_non_owner_then_validated() {
    let server = TestServer::spawn().await;
    let alice = TestClient::authenticated_alice(server.base_url.clone()).await;
    let bob = TestClient::authenticated_bob(server.base_url.clone()).await;
    let video = alice.create_video("talk").await;

    let comment = data(alice.add_comment(&video, "first!").await).await;
    let path = format!("/comments/{}", comment["id"].as_str().unwrap());

    let response = bob.patch_json(&path, json!({ "content": "hijacked" })).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = alice.patch_json(&path, json!({ "content": "" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let edited = data(alice.patch_json(&path, json!({ "content": "  edited  " })).await).await;
    assert_eq!(edited["content"], "edited");
}

#[tokio::test]
async fn test_delete_comment() {
    let server = TestServer::spawn().await;
    let alice = TestClient::authenticated_alice(server.base_url.clone()).await;
    let bob = TestClient::authenticated_bob(server.base_url.clone()).await;
    let video = alice.create_video("talk").await;

    let comment = data(bob.add_comment(&video, "bye").await).await;
    let comment_id = comment["id"].as_str().unwrap();
    let path = format!("/comments/{}", comment_id);

    // The video owner does not own the comment.
    assert_eq!(alice.delete(&path).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(bob.delete(&path).await.status(), StatusCode::OK);
    assert_eq!(bob.delete(&path).await.status(), StatusCode::NOT_FOUND);

    let comments = data(alice.get(&format!("/videos/{}/comments", video)).await).await;
    assert!(comments.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_comment_id_is_invalid() {
    let server = TestServer::spawn().await;
    let alice = TestClient::authenticated_alice(server.base_url.clone()).await;

    let response = alice
        .patch_json("/comments/123", json!({ "content": "x" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
