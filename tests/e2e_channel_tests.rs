//! End-to-end tests for channel pages and account media

mod common;

use common::{data, envelope, TestClient, TestServer, MISSING_ID, PNG_BYTES};
use reqwest::{multipart, StatusCode};

#[tokio::test]
async fn test_channel_stats() {
    let server = TestServer::spawn().await;
    let alice = TestClient::authenticated_alice(server.base_url.clone()).await;
    let bob = TestClient::authenticated_bob(server.base_url.clone()).await;

    let first = alice.create_video("one").await;
    alice.create_video("two").await;
    data(bob.get(&format!("/videos/{}", first)).await).await;
    data(bob.get(&format!("/videos/{}", first)).await).await;
    data(bob.toggle_like("videos", &first).await).await;
    data(bob.toggle_subscription(&server.alice_id.to_string()).await).await;

    let stats = data(
        bob.get(&format!("/channels/{}/stats", server.alice_id))
            .await,
    )
    .await;
    assert_eq!(stats["total_views"], 2);
    assert_eq!(stats["total_videos"], 2);
    assert_eq!(stats["total_likes"], 1);
    assert_eq!(stats["total_subscribers"], 1);

    let empty = data(
        bob.get(&format!("/channels/{}/stats", server.bob_id))
            .await,
    )
    .await;
    assert_eq!(empty["total_videos"], 0);

    assert_eq!(
        bob.get(&format!("/channels/{}/stats", MISSING_ID))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_channel_profile_reports_subscription_of_viewer() {
    let server = TestServer::spawn().await;
    let alice = TestClient::authenticated_alice(server.base_url.clone()).await;
    let anonymous = TestClient::new(server.base_url.clone());

    data(alice.toggle_subscription(&server.bob_id.to_string()).await).await;

    let profile = data(alice.get("/channels/by-username/BOB").await).await;
    assert_eq!(profile["id"], server.bob_id.to_string());
    assert_eq!(profile["subscribers_count"], 1);
    assert_eq!(profile["subscribed_to_count"], 0);
    assert_eq!(profile["is_subscribed"], true);

    let profile = data(anonymous.get("/channels/by-username/bob").await).await;
    assert_eq!(profile["is_subscribed"], false);

    let (status, body) = envelope(anonymous.get("/channels/by-username/nobody").await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Channel not found");
}

#[tokio::test]
async fn test_channel_videos_show_drafts_only_to_owner() {
    let server = TestServer::spawn().await;
    let alice = TestClient::authenticated_alice(server.base_url.clone()).await;
    let bob = TestClient::authenticated_bob(server.base_url.clone()).await;

    alice.create_video("public").await;
    let draft = alice.create_video("draft").await;
    data(alice.patch_empty(&format!("/videos/{}/publish", draft)).await).await;

    let path = format!("/channels/{}/videos", server.alice_id);
    let own = data(alice.get(&path).await).await;
    assert_eq!(own.as_array().unwrap().len(), 2);
    assert_eq!(own[0]["title"], "draft");

    let visitor = data(bob.get(&path).await).await;
    let visitor = visitor.as_array().unwrap();
    assert_eq!(visitor.len(), 1);
    assert_eq!(visitor[0]["title"], "public");
}

#[tokio::test]
async fn test_empty_history_and_liked_videos() {
    let server = TestServer::spawn().await;
    let bob = TestClient::authenticated_bob(server.base_url.clone()).await;

    let history = data(bob.get("/users/me/history").await).await;
    assert!(history.as_array().unwrap().is_empty());
    let liked = data(bob.get("/users/me/liked-videos").await).await;
    assert!(liked.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_avatar_upload_replaces_previous_image() {
    let server = TestServer::spawn().await;
    let alice = TestClient::authenticated_alice(server.base_url.clone()).await;

    let upload = || {
        let part = multipart::Part::bytes(PNG_BYTES.to_vec())
            .file_name("me.png")
            .mime_str("image/png")
            .unwrap();
        multipart::Form::new().part("avatar", part)
    };
    let send = |form: multipart::Form| {
        alice
            .client
            .patch(format!("{}/v1/users/me/avatar", server.base_url))
            .multipart(form)
            .send()
    };

    let first = data(send(upload()).await.unwrap()).await;
    let first_url = first["avatar_url"].as_str().unwrap().to_string();
    assert!(first_url.starts_with("/media/avatar/"));

    let second = data(send(upload()).await.unwrap()).await;
    let second_url = second["avatar_url"].as_str().unwrap();
    assert_ne!(second_url, first_url);

    let old = reqwest::get(format!("{}{}", server.base_url, first_url))
        .await
        .unwrap();
    assert_eq!(old.status(), StatusCode::NOT_FOUND);
    let new = reqwest::get(format!("{}{}", server.base_url, second_url))
        .await
        .unwrap();
    assert_eq!(new.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cover_upload_rejects_video_file() {
    let server = TestServer::spawn().await;
    let alice = TestClient::authenticated_alice(server.base_url.clone()).await;

    let part = multipart::Part::bytes(common::MP4_BYTES.to_vec())
        .file_name("clip.mp4")
        .mime_str("video/mp4")
        .unwrap();
    let response = alice
        .client
        .patch(format!("{}/v1/users/me/cover", server.base_url))
        .multipart(multipart::Form::new().part("cover_image", part))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
