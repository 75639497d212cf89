//! Upload, metadata and delete workflow over HTTP

use reqwest::StatusCode;
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

use crate::harness::{TestServer, patterned_bytes};

fn upload_form(title: &str, file_name: &str, contents: Vec<u8>) -> Form {
    Form::new()
        .text("title", title.to_string())
        .text("description", "uploaded in an integration test")
        .part("video", Part::bytes(contents).file_name(file_name.to_string()))
}

#[tokio::test]
async fn test_upload_stream_patch_delete_workflow() {
    let server = TestServer::start().await;
    let alice = server.sign_up("alice", "correct horse").await;
    let content = patterned_bytes(64 * 1024);

    let uploaded = server
        .client()
        .post(server.url("/videos"))
        .bearer_auth(&alice.token)
        .multipart(upload_form("Holiday", "holiday.mp4", content.clone()))
        .send()
        .await
        .unwrap();
    assert_eq!(uploaded.status(), StatusCode::CREATED);
    let video: Value = uploaded.json().await.unwrap();
    let id = video["id"].as_str().unwrap().to_string();
    assert_eq!(video["userId"], alice.user_id.as_str());
    assert_eq!(video["title"], "Holiday");
    assert!(video.get("filePath").is_none());

    let listed: Value = server
        .client()
        .get(server.url("/videos"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["id"], id.as_str());

    let partial = server
        .client()
        .get(server.stream_url(&id))
        .header(RANGE, "bytes=100-199")
        .send()
        .await
        .unwrap();
    assert_eq!(partial.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(partial.headers()[CONTENT_RANGE], "bytes 100-199/65536");
    assert_eq!(&partial.bytes().await.unwrap()[..], &content[100..200]);

    let patched = server
        .client()
        .patch(server.url(&format!("/videos/{id}")))
        .bearer_auth(&alice.token)
        .json(&json!({ "title": "Holiday 2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(patched.status(), StatusCode::OK);
    let patched: Value = patched.json().await.unwrap();
    assert_eq!(patched["title"], "Holiday 2");
    assert_eq!(patched["description"], "uploaded in an integration test");

    let stored_path = server.catalog.get(&id).unwrap().file_path;
    assert!(stored_path.exists());

    let deleted = server
        .client()
        .delete(server.url(&format!("/videos/{id}")))
        .bearer_auth(&alice.token)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    assert!(!stored_path.exists());

    let gone = server
        .client()
        .get(server.stream_url(&id))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_write_endpoints_require_token() {
    let server = TestServer::start().await;
    let video = server.register("dummy.mp4", b"some bytes");

    let upload = server
        .client()
        .post(server.url("/videos"))
        .multipart(upload_form("Nope", "nope.mp4", vec![1, 2, 3]))
        .send()
        .await
        .unwrap();
    assert_eq!(upload.status(), StatusCode::UNAUTHORIZED);

    let delete = server
        .client()
        .delete(server.url(&format!("/videos/{}", video.id)))
        .bearer_auth("wrong-token")
        .send()
        .await
        .unwrap();
    assert_eq!(delete.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(server.catalog.len(), 1);

    // Reads stay public
    let stream = server
        .client()
        .get(server.stream_url(video.id))
        .send()
        .await
        .unwrap();
    assert_eq!(stream.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_over_limit_is_rejected() {
    let server = TestServer::start().await;
    let alice = server.sign_up("alice", "correct horse").await;

    let response = server
        .client()
        .post(server.url("/videos"))
        .bearer_auth(&alice.token)
        .multipart(upload_form("Too big", "big.mp4", patterned_bytes(1024 * 1024 + 1)))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(server.catalog.is_empty());

    let leftovers = std::fs::read_dir(server.dir.path().join("uploads"))
        .unwrap()
        .count();
    assert_eq!(leftovers, 0);
}
