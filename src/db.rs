//! SQLite pool for the knowledge base and interaction log.
//!
//! Assistant turns read articles while the analytics worker appends
//! interactions and `civic get` bumps view counts, so the pool runs in WAL
//! mode with a busy timeout instead of failing on the first lock.

use anyhow::{Context, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::time::Duration;

use crate::config::Config;

/// Open (creating if needed) the database named by `[db].path`.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db = &config.db;

    if let Some(parent) = db.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(&db.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(db.busy_timeout_secs));

    SqlitePoolOptions::new()
        .max_connections(db.max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database: {}", db.path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_connect_creates_nested_file_in_wal_mode() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("kb").join("civic.sqlite");
        let pool = connect(&Config::with_db_path(path.clone())).await.unwrap();

        let mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        assert!(path.exists());
        pool.close().await;
    }

    #[tokio::test]
    async fn test_pool_size_follows_config() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = Config::with_db_path(tmp.path().join("civic.sqlite"));
        cfg.db.max_connections = 2;
        let pool = connect(&cfg).await.unwrap();
        assert_eq!(pool.options().get_max_connections(), 2);
        pool.close().await;
    }
}
