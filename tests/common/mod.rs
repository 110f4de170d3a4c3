//! Shared test harness: real `Storage` in a temp dir, router bound on a
//! random port, driven over HTTP with reqwest.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;

use studiod::{config::AppConfig, rest::build_router, storage::Storage, AppContext};

pub struct TestApp {
    pub base: String,
    pub client: reqwest::Client,
    // Kept alive so the database directory survives the test.
    _dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let config = Arc::new(AppConfig::new(
        Some(0),
        Some(dir.path().to_path_buf()),
        Some("error".to_string()),
        None,
    ));
    let storage = Arc::new(Storage::new(&config.data_dir).await.unwrap());
    let ctx = Arc::new(AppContext {
        config,
        storage,
        started_at: std::time::Instant::now(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(ctx)).await.unwrap();
    });

    TestApp {
        base: format!("http://{addr}"),
        client: reqwest::Client::new(),
        _dir: dir,
    }
}

impl TestApp {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap()
    }

    pub async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn put(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .put(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn patch(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .patch(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap()
    }

    // ─── Fixtures ───────────────────────────────────────────────────────────

    pub async fn create_project(&self, name: &str) -> String {
        let res = self
            .post("/projects", serde_json::json!({ "name": name }))
            .await;
        assert_eq!(res.status(), 201);
        let body: Value = res.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_member(&self, name: &str) -> String {
        let res = self
            .post("/team-members", serde_json::json!({ "name": name }))
            .await;
        assert_eq!(res.status(), 201);
        let body: Value = res.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_task(&self, title: &str, project_id: &str) -> String {
        let res = self
            .post(
                "/tasks",
                serde_json::json!({ "title": title, "project": project_id }),
            )
            .await;
        assert_eq!(res.status(), 201);
        let body: Value = res.json().await.unwrap();
        body["task"]["id"].as_str().unwrap().to_string()
    }
}
