//! Repository for the YouTube connection row.
//!
//! The backend binds a single account, so the connection lives in a
//! single-row table; connecting replaces any previous binding.

use sqlx::Row;
use tracing::info;

use reel_models::YouTubeConnection;

use crate::db::Store;
use crate::error::StoreResult;

/// Repository for the YouTube connection document.
pub struct ConnectionRepository {
    store: Store,
}

impl ConnectionRepository {
    /// Create a new connection repository.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// The current connection, if one is stored.
    pub async fn get(&self) -> StoreResult<Option<YouTubeConnection>> {
        let row = sqlx::query("SELECT data FROM youtube_connection WHERE id = 1")
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

    /// Store a connection, replacing any existing one.
    pub async fn set(&self, connection: &YouTubeConnection) -> StoreResult<()> {
        let data = serde_json::to_string(connection)?;
        sqlx::query(
            "INSERT INTO youtube_connection (id, data) VALUES (1, ?) \
             ON CONFLICT (id) DO UPDATE SET data = excluded.data",
        )
        .bind(data)
        .execute(self.store.pool())
        .await?;

        info!(channel_id = %connection.channel_id, "Stored YouTube connection");
        Ok(())
    }

    /// Remove the stored connection. Returns whether one existed.
    pub async fn clear(&self) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM youtube_connection WHERE id = 1")
            .execute(self.store.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
