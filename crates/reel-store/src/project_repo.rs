//! Typed repository for project rows.

use sqlx::Row;
use tracing::info;

use reel_models::{JobId, Project, ProjectId};

use crate::db::Store;
use crate::error::{StoreError, StoreResult};

/// Statuses that end a project's lifecycle; used for the scheduler's
/// overlap guard and the orchestrator's resume scan.
const TERMINAL_STATUSES: &str = "('completed', 'published', 'failed')";

/// Repository for project documents.
pub struct ProjectRepository {
    store: Store,
}

impl ProjectRepository {
    /// Create a new project repository.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Insert a new project row.
    pub async fn create(&self, project: &Project) -> StoreResult<()> {
        let data = serde_json::to_string(project)?;
        let result = sqlx::query(
            "INSERT OR IGNORE INTO projects (id, status, job_id, created_at, data) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(project.id.as_str())
        .bind(project.status.as_str())
        .bind(project.job_id.as_ref().map(|j| j.as_str().to_string()))
        .bind(project.created_at.to_rfc3339())
        .bind(data)
        .execute(self.store.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::already_exists(format!(
                "project {}",
                project.id
            )));
        }

        info!(project_id = %project.id, "Created project record");
        Ok(())
    }

    /// Get a project by ID.
    pub async fn get(&self, id: &ProjectId) -> StoreResult<Option<Project>> {
        let row = sqlx::query("SELECT data FROM projects WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(self.store.pool())
            .await?;

        match row {
            Some(row) => {
                let data: String = row.try_get("data")?;
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }

    /// Get a project, erroring when missing.
    pub async fn get_required(&self, id: &ProjectId) -> StoreResult<Project> {
        self.get(id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("project {id}")))
    }

    /// Persist the full project document as one atomic row write.
    ///
    /// The orchestrator is the only writer per project, so a full-document
    /// write cannot lose concurrent updates.
    pub async fn update(&self, project: &Project) -> StoreResult<()> {
        let data = serde_json::to_string(project)?;
        let result = sqlx::query("UPDATE projects SET status = ?, data = ? WHERE id = ?")
            .bind(project.status.as_str())
            .bind(data)
            .bind(project.id.as_str())
            .execute(self.store.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("project {}", project.id)));
        }
        Ok(())
    }

    /// List projects, newest first.
    pub async fn list(&self, page: u32, page_size: u32) -> StoreResult<(Vec<Project>, u64)> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS n FROM projects")
            .fetch_one(self.store.pool())
            .await?
            .try_get("n")?;

        let offset = (page.saturating_sub(1) as i64) * page_size as i64;
        let rows = sqlx::query(
            "SELECT data FROM projects ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(self.store.pool())
        .await?;

        let mut projects = Vec::with_capacity(rows.len());
        for row in rows {
            let data: String = row.try_get("data")?;
            projects.push(serde_json::from_str(&data)?);
        }
        Ok((projects, total as u64))
    }

    /// Projects not yet in a terminal state; the orchestrator resumes these
    /// after a restart.
    pub async fn list_non_terminal(&self) -> StoreResult<Vec<Project>> {
        let rows = sqlx::query(&format!(
            "SELECT data FROM projects WHERE status NOT IN {TERMINAL_STATUSES} \
             ORDER BY created_at ASC"
        ))
        .fetch_all(self.store.pool())
        .await?;

        let mut projects = Vec::with_capacity(rows.len());
        for row in rows {
            let data: String = row.try_get("data")?;
            projects.push(serde_json::from_str(&data)?);
        }
        Ok(projects)
    }

    /// The in-flight project attributed to a job, if any.
    ///
    /// Backs the scheduler's overlap guard: at most one non-terminal
    /// project may exist per job at any instant.
    pub async fn find_active_for_job(&self, job_id: &JobId) -> StoreResult<Option<Project>> {
        let row = sqlx::query(&format!(
            "SELECT data FROM projects WHERE job_id = ? AND status NOT IN {TERMINAL_STATUSES} \
             LIMIT 1"
        ))
        .bind(job_id.as_str())
        .fetch_optional(self.store.pool())
        .await?;

        match row {
            Some(row) => {
                let data: String = row.try_get("data")?;
                Ok(Some(serde_json::from_str(&data)?))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::{Asset, AssetType, ProjectStatus};

    async fn memory_store() -> Store {
        Store::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = memory_store().await;
        let repo = store.projects();

        let project = Project::new("Title", "prompt");
        repo.create(&project).await.unwrap();

        let loaded = repo.get(&project.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "Title");
        assert_eq!(loaded.status, ProjectStatus::Draft);

        assert!(repo
            .get(&ProjectId::from("missing"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let store = memory_store().await;
        let repo = store.projects();

        let project = Project::new("Title", "prompt");
        repo.create(&project).await.unwrap();
        let err = repo.create(&project).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_update_persists_assets_and_status() {
        let store = memory_store().await;
        let repo = store.projects();

        let mut project = Project::new("Title", "prompt");
        repo.create(&project).await.unwrap();

        project.status = ProjectStatus::GeneratingImages;
        project
            .assets
            .push(Asset::new(AssetType::Image, "p/0.png").for_scene(0));
        repo.update(&project).await.unwrap();

        let loaded = repo.get(&project.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ProjectStatus::GeneratingImages);
        assert_eq!(loaded.assets.len(), 1);
        assert_eq!(loaded.assets[0].url, "p/0.png");
    }

    #[tokio::test]
    async fn test_non_terminal_scan_and_overlap_guard() {
        let store = memory_store().await;
        let repo = store.projects();

        let job_id = JobId::new();
        let active = Project::new("active", "p")
            .with_job(job_id.clone())
            .advance_to(ProjectStatus::GeneratingVideo);
        let done = Project::new("done", "p").advance_to(ProjectStatus::Completed);
        repo.create(&active).await.unwrap();
        repo.create(&done).await.unwrap();

        let open = repo.list_non_terminal().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, active.id);

        let found = repo.find_active_for_job(&job_id).await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(active.id.clone()));

        // Finishing the project releases the guard
        let mut finished = repo.get(&active.id).await.unwrap().unwrap();
        finished.status = ProjectStatus::Published;
        repo.update(&finished).await.unwrap();
        assert!(repo.find_active_for_job(&job_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pagination() {
        let store = memory_store().await;
        let repo = store.projects();

        for i in 0..5 {
            repo.create(&Project::new(format!("p{i}"), "prompt"))
                .await
                .unwrap();
        }

        let (first, total) = repo.list(1, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(first.len(), 2);

        let (last, _) = repo.list(3, 2).await.unwrap();
        assert_eq!(last.len(), 1);
    }
}
