//! Account registration and login over HTTP

use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::harness::TestServer;

async fn post(server: &TestServer, path: &str, body: Value) -> reqwest::Response {
    server
        .client()
        .post(server.url(path))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_register_returns_created_account() {
    let server = TestServer::start().await;

    let response = post(
        &server,
        "/auth/register",
        json!({ "username": "alice", "password": "correct horse" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let account: Value = response.json().await.unwrap();
    let fields = account.as_object().unwrap();
    assert_eq!(fields.len(), 3);
    assert!(fields["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(account["username"], "alice");
    assert!(account["createdAt"].is_string());
}

#[tokio::test]
async fn test_register_rejects_incomplete_or_unknown_fields() {
    let server = TestServer::start().await;

    for body in [
        json!({ "password": "correct horse" }),
        json!({ "username": "alice" }),
        json!({}),
        json!({ "username": "alice", "password": "correct horse", "isAdmin": true }),
    ] {
        let response = post(&server, "/auth/register", body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
    }

    // None of the rejected bodies created an account
    let retry = post(
        &server,
        "/auth/register",
        json!({ "username": "alice", "password": "correct horse" }),
    )
    .await;
    assert_eq!(retry.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_register_duplicate_username_is_forbidden() {
    let server = TestServer::start().await;
    server.sign_up("alice", "correct horse").await;

    let response = post(
        &server,
        "/auth/register",
        json!({ "username": "alice", "password": "another one" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_issues_usable_access_token() {
    let server = TestServer::start().await;
    let alice = server.sign_up("alice", "correct horse").await;
    assert!(!alice.token.is_empty());

    let video = server.register("dummy.mp4", b"some bytes");
    let patched = server
        .client()
        .patch(server.url(&format!("/videos/{}", video.id)))
        .header(reqwest::header::AUTHORIZATION, format!("bearer {}", alice.token))
        .json(&json!({ "title": "Renamed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(patched.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_missing_fields_is_unauthorized() {
    let server = TestServer::start().await;
    server.sign_up("alice", "correct horse").await;

    for body in [
        json!({ "password": "correct horse" }),
        json!({ "username": "alice" }),
        json!({}),
    ] {
        let response = post(&server, "/auth/login", body.clone()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "body {body}");
    }
}

#[tokio::test]
async fn test_login_bad_credentials_are_unauthorized() {
    let server = TestServer::start().await;
    server.sign_up("alice", "correct horse").await;

    let unknown_user = post(
        &server,
        "/auth/login",
        json!({ "username": "mallory", "password": "correct horse" }),
    )
    .await;
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let wrong_password = post(
        &server,
        "/auth/login",
        json!({ "username": "alice", "password": "battery staple" }),
    )
    .await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let body: Value = wrong_password.json().await.unwrap();
    assert!(body.get("access_token").is_none());
}
