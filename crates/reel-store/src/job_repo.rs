//! Typed repository for scheduled job rows.

use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::info;

use reel_models::{JobId, ScheduledJob};

use crate::db::Store;
use crate::error::{StoreError, StoreResult};

/// Repository for scheduled job documents.
pub struct JobRepository {
    store: Store,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Insert a new job row.
    pub async fn create(&self, job: &ScheduledJob) -> StoreResult<()> {
        let data = serde_json::to_string(job)?;
        let result = sqlx::query(
            "INSERT OR IGNORE INTO scheduled_jobs (id, enabled, next_run_at, data) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(job.id.as_str())
        .bind(job.enabled)
        .bind(job.next_run_at.map(|t| t.to_rfc3339()))
        .bind(data)
        .execute(self.store.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::already_exists(format!("job {}", job.id)));
        }

        info!(job_id = %job.id, name = %job.name, "Created scheduled job");
        Ok(())
    }

    /// Get a job by ID.
    pub async fn get(&self, id: &JobId) -> StoreResult<Option<ScheduledJob>> {
        let row = sqlx::query("SELECT data FROM scheduled_jobs WHERE id = ?")
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

    /// Get a job, erroring when missing.
    pub async fn get_required(&self, id: &JobId) -> StoreResult<ScheduledJob> {
        self.get(id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("job {id}")))
    }

    /// Persist the full job document as one atomic row write.
    pub async fn update(&self, job: &ScheduledJob) -> StoreResult<()> {
        let data = serde_json::to_string(job)?;
        let result = sqlx::query(
            "UPDATE scheduled_jobs SET enabled = ?, next_run_at = ?, data = ? WHERE id = ?",
        )
        .bind(job.enabled)
        .bind(job.next_run_at.map(|t| t.to_rfc3339()))
        .bind(data)
        .bind(job.id.as_str())
        .execute(self.store.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("job {}", job.id)));
        }
        Ok(())
    }

    /// Delete a job row.
    pub async fn delete(&self, id: &JobId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM scheduled_jobs WHERE id = ?")
            .bind(id.as_str())
            .execute(self.store.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("job {id}")));
        }
        Ok(())
    }

    /// All jobs, oldest first.
    pub async fn list(&self) -> StoreResult<Vec<ScheduledJob>> {
        let rows = sqlx::query("SELECT data FROM scheduled_jobs ORDER BY id")
            .fetch_all(self.store.pool())
            .await?;

        let mut jobs = Vec::with_capacity(rows.len());
        for row in rows {
            let data: String = row.try_get("data")?;
            jobs.push(serde_json::from_str(&data)?);
        }
        Ok(jobs)
    }

    /// Enabled jobs whose `next_run_at` is at or before `now`.
    ///
    /// RFC 3339 UTC strings compare lexicographically, so the filter runs
    /// in SQL against the indexed column.
    pub async fn list_due(&self, now: DateTime<Utc>) -> StoreResult<Vec<ScheduledJob>> {
        let rows = sqlx::query(
            "SELECT data FROM scheduled_jobs \
             WHERE enabled = 1 AND next_run_at IS NOT NULL AND next_run_at <= ? \
             ORDER BY next_run_at ASC",
        )
        .bind(now.to_rfc3339())
        .fetch_all(self.store.pool())
        .await?;

        let mut jobs = Vec::with_capacity(rows.len());
        for row in rows {
            let data: String = row.try_get("data")?;
            jobs.push(serde_json::from_str(&data)?);
        }
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn memory_store() -> Store {
        Store::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_job_crud() {
        let store = memory_store().await;
        let repo = store.jobs();

        let job = ScheduledJob::new("daily", "0 2 * * *", "tech");
        repo.create(&job).await.unwrap();

        let loaded = repo.get(&job.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "daily");
        assert!(loaded.enabled);

        let disabled = loaded.set_enabled(false);
        repo.update(&disabled).await.unwrap();
        assert!(!repo.get(&job.id).await.unwrap().unwrap().enabled);

        repo.delete(&job.id).await.unwrap();
        assert!(repo.get(&job.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&job.id).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_list_due_filters_enabled_and_time() {
        let store = memory_store().await;
        let repo = store.jobs();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let mut due = ScheduledJob::new("due", "* * * * *", "a");
        due.next_run_at = Some(now - chrono::Duration::minutes(1));
        repo.create(&due).await.unwrap();

        let mut future = ScheduledJob::new("future", "* * * * *", "b");
        future.next_run_at = Some(now + chrono::Duration::minutes(5));
        repo.create(&future).await.unwrap();

        let mut disabled = ScheduledJob::new("disabled", "* * * * *", "c");
        disabled.next_run_at = Some(now - chrono::Duration::minutes(1));
        disabled.enabled = false;
        repo.create(&disabled).await.unwrap();

        let never_run = ScheduledJob::new("unscheduled", "* * * * *", "d");
        repo.create(&never_run).await.unwrap();

        let due_jobs = repo.list_due(now).await.unwrap();
        assert_eq!(due_jobs.len(), 1);
        assert_eq!(due_jobs[0].name, "due");
    }
}
