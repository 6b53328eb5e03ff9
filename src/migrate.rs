//! Database schema migrations.
//!
//! Creates the `articles` and `interactions` tables and their indexes.
//! Every statement is `IF NOT EXISTS`, so running migrations repeatedly is
//! safe.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Connect to the configured database and apply the schema.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Apply the schema on an existing pool.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            summary TEXT,
            category TEXT NOT NULL,
            tags_json TEXT NOT NULL DEFAULT '[]',
            source_url TEXT,
            author_id TEXT,
            is_public INTEGER NOT NULL DEFAULT 1,
            priority_score INTEGER NOT NULL DEFAULT 0,
            view_count INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS interactions (
            id TEXT PRIMARY KEY,
            session_id TEXT,
            query_text TEXT NOT NULL,
            response_text TEXT NOT NULL,
            confidence REAL NOT NULL,
            response_time_ms INTEGER NOT NULL,
            result_count INTEGER NOT NULL,
            has_results INTEGER NOT NULL,
            sources_json TEXT NOT NULL DEFAULT '[]',
            response_type TEXT NOT NULL,
            context_json TEXT NOT NULL DEFAULT '{}',
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_articles_public_priority ON articles(is_public, priority_score DESC)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_articles_category ON articles(category)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_interactions_session ON interactions(session_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_interactions_created_at ON interactions(created_at DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
