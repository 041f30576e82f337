//! Common test utilities for atl integration tests.
//!
//! Provides `TestEnv` for isolated config/state directories and `MockApi`, an
//! in-process stand-in for the design API.

#![allow(dead_code)]

use std::sync::mpsc;
use std::thread;

use assert_cmd::Command;
use axum::Router;
pub use tempfile::TempDir;
use tokio::sync::oneshot;

/// A test environment with isolated configuration.
///
/// Each `TestEnv` owns two temporary directories:
/// - `config_dir`: holds config.kdl (via `ATL_CONFIG_DIR`)
/// - `data_dir`: holds state.kdl (via `ATL_DATA_DIR`)
///
/// The `atl()` method returns a `Command` with both set per-invocation, which
/// keeps tests parallel-safe.
pub struct TestEnv {
    pub config_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            config_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the atl binary with isolated config.
    pub fn atl(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_atl"));
        cmd.env("ATL_CONFIG_DIR", self.config_dir.path());
        cmd.env("ATL_DATA_DIR", self.data_dir.path());
        cmd.env_remove("ATL_API_URL");
        cmd.env_remove("ATL_API_TOKEN");
        cmd.env_remove("ATL_LOG");
        cmd
    }

    /// An `atl` command pointed at `api`.
    pub fn atl_with(&self, api: &MockApi) -> Command {
        let mut cmd = self.atl();
        cmd.env("ATL_API_URL", &api.url);
        cmd
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.config_dir.path().join("config.kdl")
    }

    pub fn state_path(&self) -> std::path::PathBuf {
        self.data_dir.path().join("state.kdl")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// An axum router served on an ephemeral localhost port.
///
/// The server runs on its own thread and runtime so it can back both
/// `#[tokio::test]` client tests and blocking CLI tests.
pub struct MockApi {
    pub url: String,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockApi {
    pub fn start(router: Router) -> Self {
        Self::start_with(|_| router)
    }

    /// Start a server whose router needs its own base URL (e.g. to hand out
    /// absolute upload URLs).
    pub fn start_with<F>(build: F) -> Self
    where
        F: FnOnce(String) -> Router + Send + 'static,
    {
        let (url_tx, url_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                let url = format!("http://{}", listener.local_addr().unwrap());
                let router = build(url.clone());
                url_tx.send(url).unwrap();
                axum::serve(listener, router)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .unwrap();
            });
        });

        Self {
            url: url_rx.recv().unwrap(),
            shutdown: Some(shutdown_tx),
        }
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// JSON for a comment as the API returns it.
pub fn comment_json(id: &str, parent: Option<&str>, minute: u32) -> serde_json::Value {
    let ts = format!("2024-05-01T09:{:02}:00Z", minute);
    let mut value = serde_json::json!({
        "id": id,
        "content": format!("comment {}", id),
        "authorId": "u1",
        "authorName": "Ana Silva",
        "createdAt": ts,
        "updatedAt": ts,
        "sectionId": "sec-1",
    });
    if let Some(parent) = parent {
        value["parentId"] = serde_json::json!(parent);
    }
    value
}

/// A small team roster.
pub fn roster_json() -> serde_json::Value {
    serde_json::json!([
        { "id": "u1", "name": "Ana Silva", "role": "Designer" },
        { "id": "u2", "name": "Bo Chen", "role": "Site Lead" },
        { "id": "u3", "name": "Anabel Ortiz" }
    ])
}

pub fn checklist_json() -> serde_json::Value {
    serde_json::json!([
        { "id": "i1", "title": "Measure walls", "completed": false, "position": 0 },
        { "id": "i2", "title": "Order samples", "completed": false, "position": 1 },
        { "id": "i3", "title": "Confirm palette", "completed": true, "position": 2 }
    ])
}
