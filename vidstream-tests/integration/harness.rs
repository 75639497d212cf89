//! Loopback server shared by the integration tests

use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use vidstream_core::VideoCatalog;
use vidstream_core::catalog::{NewVideo, VideoRecord};
use vidstream_core::config::VidstreamConfig;
use vidstream_core::test_fixtures::{fast_auth_config, write_video_file};
use vidstream_web::AppState;

/// Owner recorded on videos registered straight into the catalog.
pub const FIXTURE_OWNER: &str = "integration-fixture";

/// Registered account and the access token it logged in with.
pub struct SignedIn {
    pub user_id: String,
    pub token: String,
}

/// Running API bound to an ephemeral port, stopped on drop.
pub struct TestServer {
    pub base_url: String,
    pub catalog: Arc<VideoCatalog>,
    pub dir: TempDir,
    client: reqwest::Client,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with_chunk_size(vidstream_core::streaming::DEFAULT_CHUNK_SIZE).await
    }

    pub async fn start_with_chunk_size(read_chunk_size: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let uploads_dir = dir.path().join("uploads");
        std::fs::create_dir_all(&uploads_dir).unwrap();

        let mut config = VidstreamConfig::default();
        config.server.port = 0;
        config.storage.uploads_dir = uploads_dir;
        config.storage.read_chunk_size = read_chunk_size;
        config.storage.max_upload_bytes = 1024 * 1024;
        config.auth = fast_auth_config();

        let catalog = Arc::new(VideoCatalog::new());
        let state = AppState::new(config, catalog.clone()).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let _ = vidstream_web::serve(listener, state).await;
        });

        Self {
            base_url: format!("http://{address}"),
            catalog,
            dir,
            client: reqwest::Client::new(),
            task,
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn stream_url(&self, video_id: impl std::fmt::Display) -> String {
        self.url(&format!("/videos/{video_id}/stream"))
    }

    /// Register `username` and log in over HTTP.
    pub async fn sign_up(&self, username: &str, password: &str) -> SignedIn {
        let credentials = json!({ "username": username, "password": password });

        let registered = self
            .client
            .post(self.url("/auth/register"))
            .json(&credentials)
            .send()
            .await
            .unwrap();
        assert_eq!(registered.status(), reqwest::StatusCode::CREATED);
        let account: Value = registered.json().await.unwrap();

        let logged_in = self
            .client
            .post(self.url("/auth/login"))
            .json(&credentials)
            .send()
            .await
            .unwrap();
        assert_eq!(logged_in.status(), reqwest::StatusCode::OK);
        let body: Value = logged_in.json().await.unwrap();

        SignedIn {
            user_id: account["id"].as_str().unwrap().to_string(),
            token: body["access_token"].as_str().unwrap().to_string(),
        }
    }

    /// Write `contents` to disk and register it directly in the catalog.
    pub fn register(&self, name: &str, contents: &[u8]) -> VideoRecord {
        let path = write_video_file(self.dir.path(), name, contents);
        self.catalog
            .create(NewVideo {
                user_id: FIXTURE_OWNER.to_string(),
                title: name.to_string(),
                description: "integration fixture".to_string(),
                file_path: path,
            })
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Deterministic non-repeating-ish payload so misplaced chunks are caught.
pub fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
