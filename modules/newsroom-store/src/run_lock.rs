use chrono::Utc;

use crate::error::Result;
use crate::Store;

const LOCK_ID: &str = "pipeline";

impl Store {
    /// Acquire the single-writer run lock (C12), atomically. A stale lock
    /// (started longer than `timeout_min` ago and never released) is treated
    /// as abandoned and reclaimed. Seeds the lock row on first use, mirroring
    /// the "missing lock row is treated as no lock held" policy.
    pub async fn acquire_lock(&self, timeout_min: i64) -> Result<bool> {
        sqlx::query(
            "INSERT INTO pipeline_run_lock (id, is_running) VALUES ($1, false) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(LOCK_ID)
        .execute(self.pool())
        .await?;

        let result = sqlx::query(
            r#"
            UPDATE pipeline_run_lock
            SET is_running = true, started_at = $2, finished_at = NULL
            WHERE id = $1
              AND (NOT is_running OR started_at < $2 - ($3 || ' minutes')::interval)
            "#,
        )
        .bind(LOCK_ID)
        .bind(Utc::now())
        .bind(timeout_min.to_string())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn release_lock(&self) -> Result<()> {
        sqlx::query(
            "UPDATE pipeline_run_lock SET is_running = false, finished_at = $2 WHERE id = $1",
        )
        .bind(LOCK_ID)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
