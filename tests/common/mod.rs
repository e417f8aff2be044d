#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use sqlx::PgPool;

use taskflow_api::app;
use taskflow_api::config::DatabaseConfig;
use taskflow_api::database::DatabaseManager;
use taskflow_api::state::AppState;

/// Address that refuses connections, for tests that never reach PostgreSQL
pub const UNREACHABLE_DATABASE_URL: &str = "postgres://taskflow@127.0.0.1:1/taskflow";

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    /// Direct pool for row-level assertions; only set by `with_database`
    pub pool: Option<PgPool>,
}

impl TestServer {
    /// Serve the router on a free port inside the current test runtime
    pub async fn spawn(database_url: &str) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let pool = DatabaseManager::connect_lazy(&DatabaseConfig {
            url: Some(database_url.to_string()),
            max_connections: 5,
            connection_timeout: 2,
        })?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        let router = app::router(AppState::new(pool));
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self { base_url, client: reqwest::Client::new(), pool: None };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    /// Server against `TEST_DATABASE_URL` with migrations applied, or `None` when unset
    pub async fn with_database() -> Result<Option<Self>> {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping database test");
            return Ok(None);
        };
        let pool = DatabaseManager::connect(&DatabaseConfig {
            url: Some(url.clone()),
            max_connections: 2,
            connection_timeout: 5,
        })
        .await?;
        DatabaseManager::migrate(&pool).await?;
        let mut server = Self::spawn(&url).await?;
        server.pool = Some(pool);
        Ok(Some(server))
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// Rows in `table` whose `task_id` matches
    pub async fn task_rows(&self, table: &str, task_id: i64) -> Result<i64> {
        let pool = self.pool.as_ref().context("test server has no database pool")?;
        let sql = format!("SELECT COUNT(*) FROM {} WHERE task_id = $1", table);
        let count = sqlx::query_scalar::<_, i64>(&sql).bind(task_id as i32).fetch_one(pool).await?;
        Ok(count)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register a fresh account and return `(user id, token)`
    pub async fn register(&self, first_name: &str) -> Result<(i64, String)> {
        let email = format!("{}-{}@example.com", first_name.to_lowercase(), uuid::Uuid::new_v4());
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({
                "firstName": first_name,
                "lastName": "Tester",
                "email": email,
                "password": "secret123"
            }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let body: Value = res.json().await?;
        let id = body["data"]["user"]["id"].as_i64().context("missing user id")?;
        let token = body["data"]["token"].as_str().context("missing token")?.to_string();
        Ok((id, token))
    }
}
