//! Range requests against a live server

use futures::StreamExt;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE};
use vidstream_core::catalog::NewVideo;
use vidstream_core::test_fixtures::DUMMY_VIDEO_CONTENT;

use crate::harness::{FIXTURE_OWNER, TestServer, patterned_bytes};

#[tokio::test]
async fn test_full_download_without_range() {
    let server = TestServer::start().await;
    let video = server.register("dummy.mp4", DUMMY_VIDEO_CONTENT);

    let response = server
        .client()
        .get(server.stream_url(video.id))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[ACCEPT_RANGES], "bytes");
    assert_eq!(response.headers()[CONTENT_LENGTH], "31");
    assert_eq!(response.headers()[CONTENT_TYPE], "video/mp4");
    assert!(response.headers().get(CONTENT_RANGE).is_none());
    assert_eq!(&response.bytes().await.unwrap()[..], DUMMY_VIDEO_CONTENT);
}

#[tokio::test]
async fn test_partial_download_forms() {
    let server = TestServer::start().await;
    let video = server.register("dummy.mp4", DUMMY_VIDEO_CONTENT);

    let cases: [(&str, &str, &[u8]); 4] = [
        ("bytes=0-4", "bytes 0-4/31", b"dummy"),
        ("bytes=6-9", "bytes 6-9/31", b"data"),
        ("bytes=21-", "bytes 21-30/31", b"streaming\n"),
        ("bytes=-10", "bytes 21-30/31", b"streaming\n"),
    ];

    for (range, content_range, expected) in cases {
        let response = server
            .client()
            .get(server.stream_url(video.id))
            .header(RANGE, range)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT, "{range}");
        assert_eq!(response.headers()[CONTENT_RANGE], content_range, "{range}");
        assert_eq!(
            response.headers()[CONTENT_LENGTH],
            expected.len().to_string().as_str(),
            "{range}"
        );
        assert_eq!(&response.bytes().await.unwrap()[..], expected, "{range}");
    }
}

#[tokio::test]
async fn test_unusable_ranges_are_rejected_with_400() {
    let server = TestServer::start().await;
    let video = server.register("dummy.mp4", DUMMY_VIDEO_CONTENT);

    for range in [
        "bytes=1000-2000",
        "bytes=0-31",
        "bytes=5-2",
        "bytes=0-1,4-5",
        "items=0-4",
        "bytes=abc",
    ] {
        let response = server
            .client()
            .get(server.stream_url(video.id))
            .header(RANGE, range)
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{range}");
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], 400, "{range}");
        assert!(body["error"].is_string(), "{range}");
    }
}

#[tokio::test]
async fn test_unknown_video_is_404() {
    let server = TestServer::start().await;

    for id in [uuid::Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let response = server
            .client()
            .get(server.stream_url(&id))
            .header(RANGE, "bytes=0-4")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{id}");
    }
}

#[tokio::test]
async fn test_large_range_arrives_in_order() {
    let server = TestServer::start_with_chunk_size(4096).await;
    let content = patterned_bytes(1024 * 1024);
    let video = server.register("large.webm", &content);

    let response = server
        .client()
        .get(server.stream_url(video.id))
        .header(RANGE, "bytes=1000-700999")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers()[CONTENT_RANGE],
        format!("bytes 1000-700999/{}", content.len()).as_str()
    );
    assert_eq!(response.headers()[CONTENT_TYPE], "video/webm");

    let body = response.bytes().await.unwrap();
    assert_eq!(body.len(), 700_000);
    assert_eq!(&body[..], &content[1000..701_000]);
}

#[tokio::test]
async fn test_concurrent_readers_of_same_file() {
    let server = TestServer::start_with_chunk_size(1024).await;
    let content = patterned_bytes(256 * 1024);
    let video = server.register("shared.mp4", &content);

    let requests = (0..8u64).map(|i| {
        let client = server.client().clone();
        let url = server.stream_url(video.id);
        let start = i * 30_000;
        let end = start + 20_000 - 1;
        async move {
            let response = client
                .get(url)
                .header(RANGE, format!("bytes={start}-{end}"))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
            (start, end, response.bytes().await.unwrap())
        }
    });

    for (start, end, body) in futures::future::join_all(requests).await {
        assert_eq!(&body[..], &content[start as usize..=end as usize]);
    }
}

#[tokio::test]
async fn test_client_disconnect_mid_stream_leaves_server_healthy() {
    let server = TestServer::start_with_chunk_size(1024).await;
    let content = patterned_bytes(8 * 1024 * 1024);
    let video = server.register("long.mp4", &content);

    for _ in 0..4 {
        let response = server
            .client()
            .get(server.stream_url(video.id))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut body = response.bytes_stream();
        let first = body.next().await.unwrap().unwrap();
        assert!(!first.is_empty());
        assert_eq!(&first[..], &content[..first.len()]);
        drop(body);
    }

    let response = server
        .client()
        .get(server.stream_url(video.id))
        .header(RANGE, "bytes=-1024")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        &response.bytes().await.unwrap()[..],
        &content[content.len() - 1024..]
    );

    // The abandoned reads must not pin the file: move it, register the new
    // location and stream all of it from there.
    let moved = video.file_path.with_file_name("moved.mp4");
    std::fs::rename(&video.file_path, &moved).unwrap();
    let relocated = server
        .catalog
        .create(NewVideo {
            user_id: FIXTURE_OWNER.to_string(),
            title: "moved.mp4".to_string(),
            description: "relocated after disconnects".to_string(),
            file_path: moved.clone(),
        })
        .unwrap();

    let stale = server
        .client()
        .get(server.stream_url(video.id))
        .send()
        .await
        .unwrap();
    assert_eq!(stale.status(), StatusCode::NOT_FOUND);

    let response = server
        .client()
        .get(server.stream_url(relocated.id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_LENGTH], content.len().to_string());
    let body = response.bytes().await.unwrap();
    assert_eq!(body.len(), content.len());
    assert!(body[..] == content[..]);

    std::fs::remove_file(&moved).unwrap();
    let removed = server
        .client()
        .get(server.stream_url(relocated.id))
        .send()
        .await
        .unwrap();
    assert_eq!(removed.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_file_replaced_between_requests_uses_new_size() {
    let server = TestServer::start().await;
    let video = server.register("growing.mp4", b"short");

    let first = server
        .client()
        .get(server.stream_url(video.id))
        .send()
        .await
        .unwrap();
    assert_eq!(first.headers()[CONTENT_LENGTH], "5");
    let _ = first.bytes().await.unwrap();

    std::fs::write(&video.file_path, b"a good deal longer").unwrap();

    let second = server
        .client()
        .get(server.stream_url(video.id))
        .header(RANGE, "bytes=7-10")
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(second.headers()[CONTENT_RANGE], "bytes 7-10/18");
    assert_eq!(&second.bytes().await.unwrap()[..], b"deal");
}
