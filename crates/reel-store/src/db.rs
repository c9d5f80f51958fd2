//! SQLite-backed document store.
//!
//! Records are key-addressed rows: the full document serialized as JSON in
//! `data`, next to the handful of columns the scheduler and orchestrator
//! query by (status, enabled, next_run_at). A single-row UPDATE is the unit
//! of persistence, so every transition commits atomically or not at all.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

use crate::connection_repo::ConnectionRepository;
use crate::error::StoreResult;
use crate::job_repo::JobRepository;
use crate::project_repo::ProjectRepository;

/// Handle to the backing database, cheap to clone.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Connect and run schema setup.
    ///
    /// `database_url` follows sqlx conventions, e.g. `sqlite:reelforge.db`
    /// or `sqlite::memory:` for tests. In-memory databases are pinned to a
    /// single connection so every handle sees the same data.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(5);
        if database_url.contains(":memory:") {
            pool_options = pool_options.max_connections(1);
        }

        let pool = pool_options.connect_with(options).await?;

        let store = Self { pool };
        store.init_schema().await?;
        info!("Store ready at {}", database_url);
        Ok(store)
    }

    /// Create config from the `DATABASE_URL` environment variable.
    pub async fn from_env() -> StoreResult<Self> {
        let url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:reelforge.db".to_string());
        Self::connect(&url).await
    }

    async fn init_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                job_id TEXT,
                created_at TEXT NOT NULL,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_projects_status ON projects (status)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_projects_job_id ON projects (job_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scheduled_jobs (
                id TEXT PRIMARY KEY,
                enabled INTEGER NOT NULL,
                next_run_at TEXT,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS youtube_connection (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the underlying pool. Mostly useful in tests that reopen the
    /// same database file.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Repository for project rows.
    pub fn projects(&self) -> ProjectRepository {
        ProjectRepository::new(self.clone())
    }

    /// Repository for scheduled job rows.
    pub fn jobs(&self) -> JobRepository {
        JobRepository::new(self.clone())
    }

    /// Repository for the YouTube connection row.
    pub fn connections(&self) -> ConnectionRepository {
        ConnectionRepository::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{Project, ProjectStatus};

    #[tokio::test]
    async fn test_records_survive_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}/reelforge.db", dir.path().display());

        let project = Project::new("durable", "prompt").advance_to(ProjectStatus::Casting);
        {
            let store = Store::connect(&url).await.unwrap();
            store.projects().create(&project).await.unwrap();
            store.close().await;
        }

        // A fresh process sees the row exactly as persisted
        let store = Store::connect(&url).await.unwrap();
        let loaded = store.projects().get(&project.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "durable");
        assert_eq!(loaded.status, ProjectStatus::Casting);

        // And the resume scan picks it up
        let open = store.projects().list_non_terminal().await.unwrap();
        assert_eq!(open.len(), 1);
    }
}
