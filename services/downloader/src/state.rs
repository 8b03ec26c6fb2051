//! Fetch state persistence using SQLite with sqlx.
//!
//! Tracks every URL a fetch run touched so completed files are skipped on the
//! next run and failures keep their last error.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS fetches (
        url TEXT PRIMARY KEY,
        path TEXT NOT NULL,
        status TEXT DEFAULT 'pending',
        retry_count INTEGER DEFAULT 0,
        total_bytes INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        error_message TEXT
    )
"#;

/// Lifecycle of one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Pending,
    InProgress,
    Retrying,
    Completed,
    Failed,
}

impl FetchStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Retrying => "retrying",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    fn from_str(s: &str) -> Self {
        match s {
            "in_progress" => Self::InProgress,
            "retrying" => Self::Retrying,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// One row of the fetch table.
#[derive(Debug, Clone)]
pub struct FetchRecord {
    pub url: String,
    pub status: FetchStatus,
    pub retry_count: u32,
    pub error_message: Option<String>,
}

/// Counts per status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub failed: u64,
    pub total_bytes: u64,
}

pub struct FetchState {
    pool: SqlitePool,
}

impl FetchState {
    /// Open or create the state database at the given path.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to open SQLite database")?;

        Self::init(&pool).await?;
        info!(path = %path.display(), "Opened fetch state database");

        Ok(Self { pool })
    }

    /// Open an in-memory database (for testing).
    pub async fn open_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::init(&pool).await?;
        Ok(Self { pool })
    }

    async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(SCHEMA).execute(pool).await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_fetches_status ON fetches(status)")
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a URL as pending unless it is already known.
    pub async fn queue(&self, url: &str, path: &Path) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let path = path.to_string_lossy().into_owned();

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO fetches (url, path, status, created_at, updated_at)
            VALUES (?, ?, 'pending', ?, ?)
            "#,
        )
        .bind(url)
        .bind(&path)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(url = %url, "Queued fetch");
        Ok(())
    }

    pub async fn update_status(&self, url: &str, status: FetchStatus) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query("UPDATE fetches SET status = ?, updated_at = ? WHERE url = ?")
            .bind(status.as_str())
            .bind(&now)
            .bind(url)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Mark a URL retrying and bump its retry count.
    pub async fn record_retry(&self, url: &str, error: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            UPDATE fetches
            SET status = 'retrying', retry_count = retry_count + 1,
                error_message = ?, updated_at = ?
            WHERE url = ?
            "#,
        )
        .bind(error)
        .bind(&now)
        .bind(url)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_completed(&self, url: &str, total_bytes: u64) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            UPDATE fetches
            SET status = 'completed', total_bytes = ?, error_message = NULL, updated_at = ?
            WHERE url = ?
            "#,
        )
        .bind(total_bytes as i64)
        .bind(&now)
        .bind(url)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_failed(&self, url: &str, error: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "UPDATE fetches SET status = 'failed', error_message = ?, updated_at = ? WHERE url = ?",
        )
        .bind(error)
        .bind(&now)
        .bind(url)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Check if a URL has already been fetched.
    pub async fn is_completed(&self, url: &str) -> Result<bool> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM fetches WHERE url = ? AND status = 'completed'")
                .bind(url)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.0 > 0)
    }

    pub async fn get(&self, url: &str) -> Result<Option<FetchRecord>> {
        let row: Option<(String, String, i64, Option<String>)> = sqlx::query_as(
            "SELECT url, status, retry_count, error_message FROM fetches WHERE url = ?",
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| FetchRecord {
            url: row.0,
            status: FetchStatus::from_str(&row.1),
            retry_count: row.2 as u32,
            error_message: row.3,
        }))
    }

    pub async fn get_stats(&self) -> Result<FetchStats> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*), COALESCE(SUM(total_bytes), 0)
            FROM fetches
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut stats = FetchStats::default();
        for (status, count, bytes) in rows {
            let count = count as u64;
            match FetchStatus::from_str(&status) {
                FetchStatus::Pending => stats.pending += count,
                FetchStatus::InProgress | FetchStatus::Retrying => stats.in_progress += count,
                FetchStatus::Completed => {
                    stats.completed += count;
                    stats.total_bytes += bytes as u64;
                }
                FetchStatus::Failed => stats.failed += count,
            }
        }

        Ok(stats)
    }
}
