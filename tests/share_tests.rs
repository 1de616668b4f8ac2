mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{body_json, spawn_app};
use serde_json::{Value, json};

async fn create_share(
    app: &common::TestApp,
    cookie: &str,
    video_id: &Value,
    options: Value,
) -> axum::http::Response<axum::body::Body> {
    app.send_json(
        "POST",
        &format!("/api/admin/videos/{video_id}/shares"),
        Some(cookie),
        &options,
    )
    .await
}

#[tokio::test]
async fn test_view_limited_share_scenario() {
    let app = spawn_app().await;
    let admin = app.admin_cookie().await;
    let video = app.upload(&admin, "Private", "secret.mp4", false).await;

    let response = create_share(&app, &admin, &video["id"], json!({ "max_views": 2 })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let share = body_json(response).await["data"].clone();
    let token = share["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 43);
    assert_eq!(share["view_count"], 0);
    assert_eq!(share["is_valid"], true);

    let uri = format!("/api/videos/{}?token={}", video["id"], token);
    for _ in 0..2 {
        let response = app.get(&uri, None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(
            body["data"]["stream_url"]
                .as_str()
                .unwrap()
                .ends_with(&format!("?token={token}"))
        );
    }

    let response = app.get(&uri, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(
        app.get(
            &format!("/api/admin/videos/{}/shares", video["id"]),
            Some(&admin),
        )
        .await,
    )
    .await;
    let link = &body["data"][0];
    assert_eq!(link["view_count"], 2);
    assert_eq!(link["is_valid"], false);
    assert_eq!(link["remaining_views"], 0);
}

#[tokio::test]
async fn test_streaming_does_not_count_views() {
    let app = spawn_app().await;
    let admin = app.admin_cookie().await;
    let video = app.upload(&admin, "Private", "secret.mp4", false).await;

    let share = body_json(create_share(&app, &admin, &video["id"], json!({ "max_views": 1 })).await)
        .await["data"]
        .clone();
    let token = share["token"].as_str().unwrap();

    let stream_uri = format!("/api/stream/{}?token={}", video["id"], token);
    for _ in 0..3 {
        assert_eq!(app.get(&stream_uri, None).await.status(), StatusCode::OK);
    }

    let refreshed = app
        .state
        .share_service()
        .get(share["id"].as_i64().unwrap() as i32)
        .await
        .unwrap();
    assert_eq!(refreshed.view_count, 0);
}

#[tokio::test]
async fn test_expiring_share_follows_clock() {
    let app = spawn_app().await;
    let admin = app.admin_cookie().await;
    let video = app.upload(&admin, "Private", "secret.webm", false).await;

    let share = body_json(
        create_share(&app, &admin, &video["id"], json!({ "expires_hours": 24 })).await,
    )
    .await["data"]
        .clone();
    let landing = format!("/api/share/{}", share["token"].as_str().unwrap());

    let response = app.get(&landing, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], video["id"]);

    app.clock.advance(Duration::hours(24));

    let response = app.get(&landing, None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_toggle_and_delete_share() {
    let app = spawn_app().await;
    let admin = app.admin_cookie().await;
    let video = app.upload(&admin, "Private", "secret.mkv", false).await;

    let share = body_json(create_share(&app, &admin, &video["id"], json!({})).await).await["data"]
        .clone();
    let toggle_uri = format!("/api/admin/shares/{}/toggle", share["id"]);
    let landing = format!("/api/share/{}", share["token"].as_str().unwrap());

    let body = body_json(app.send_empty("PUT", &toggle_uri, Some(&admin)).await).await;
    assert_eq!(body["data"]["is_active"], false);
    assert_eq!(app.get(&landing, None).await.status(), StatusCode::FORBIDDEN);

    let body = body_json(app.send_empty("PUT", &toggle_uri, Some(&admin)).await).await;
    assert_eq!(body["data"]["is_active"], true);
    assert_eq!(app.get(&landing, None).await.status(), StatusCode::OK);

    let delete_uri = format!("/api/admin/shares/{}", share["id"]);
    let response = app.send_empty("DELETE", &delete_uri, Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.get(&landing, None).await.status(), StatusCode::NOT_FOUND);

    let response = app.send_empty("DELETE", &delete_uri, Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_share_validation() {
    let app = spawn_app().await;
    let admin = app.admin_cookie().await;
    let video = app.upload(&admin, "Private", "secret.mp4", false).await;

    let response = create_share(&app, &admin, &video["id"], json!({ "expires_hours": 0 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = create_share(&app, &admin, &video["id"], json!({ "max_views": 0 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = create_share(&app, &admin, &json!(9999), json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(
        app.get("/api/share/not-a-real-token", None).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_token_is_bound_to_its_video() {
    let app = spawn_app().await;
    let admin = app.admin_cookie().await;
    let first = app.upload(&admin, "First", "first.mp4", false).await;
    let second = app.upload(&admin, "Second", "second.mp4", false).await;

    let share = body_json(create_share(&app, &admin, &first["id"], json!({})).await).await["data"]
        .clone();
    let token = share["token"].as_str().unwrap();

    let response = app
        .get(&format!("/api/videos/{}?token={}", second["id"], token), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deleting_video_removes_its_shares() {
    let app = spawn_app().await;
    let admin = app.admin_cookie().await;
    let video = app.upload(&admin, "Private", "secret.mp4", false).await;

    let share = body_json(create_share(&app, &admin, &video["id"], json!({})).await).await["data"]
        .clone();

    let response = app
        .send_empty(
            "DELETE",
            &format!("/api/admin/videos/{}", video["id"]),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let lookup = app
        .state
        .share_service()
        .find_by_token(share["token"].as_str().unwrap())
        .await
        .unwrap();
    assert!(lookup.is_none());
    assert!(app.stored_files().is_empty());
}
