//! Knowledge-base and assistant usage overview.
//!
//! Used by `civic stats` to summarize what the knowledge base holds and how
//! the assistant has been answering: article counts, interaction counts,
//! average confidence, how often a query found no articles, and a breakdown
//! by response type.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;

/// Per-response-type interaction counts.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeStats {
    pub response_type: String,
    pub count: i64,
    pub avg_confidence: f64,
}

/// Aggregate usage numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageStats {
    pub articles: i64,
    pub public_articles: i64,
    pub total_views: i64,
    pub interactions: i64,
    pub avg_confidence: Option<f64>,
    pub zero_result_interactions: i64,
    pub last_interaction_ts: Option<i64>,
    pub by_type: Vec<TypeStats>,
}

impl UsageStats {
    /// Share of interactions whose query matched no article, in percent.
    pub fn zero_result_pct(&self) -> i64 {
        if self.interactions > 0 {
            (self.zero_result_interactions * 100) / self.interactions
        } else {
            0
        }
    }
}

pub async fn collect_stats(pool: &SqlitePool) -> Result<UsageStats> {
    let articles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
        .fetch_one(pool)
        .await?;
    let public_articles: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE is_public = 1")
            .fetch_one(pool)
            .await?;
    let total_views: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(view_count), 0) FROM articles")
        .fetch_one(pool)
        .await?;

    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS total,
            AVG(confidence) AS avg_confidence,
            COALESCE(SUM(CASE WHEN has_results = 0 THEN 1 ELSE 0 END), 0) AS zero_results,
            MAX(created_at) AS last_ts
        FROM interactions
        "#,
    )
    .fetch_one(pool)
    .await?;

    let type_rows = sqlx::query(
        r#"
        SELECT response_type, COUNT(*) AS n, AVG(confidence) AS avg_confidence
        FROM interactions
        GROUP BY response_type
        ORDER BY n DESC, response_type ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let by_type = type_rows
        .iter()
        .map(|r| TypeStats {
            response_type: r.get("response_type"),
            count: r.get("n"),
            avg_confidence: r.get::<Option<f64>, _>("avg_confidence").unwrap_or(0.0),
        })
        .collect();

    Ok(UsageStats {
        articles,
        public_articles,
        total_views,
        interactions: row.get("total"),
        avg_confidence: row.get("avg_confidence"),
        zero_result_interactions: row.get("zero_results"),
        last_interaction_ts: row.get("last_ts"),
        by_type,
    })
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let stats = collect_stats(&pool).await?;
    pool.close().await;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Civic Assist: Knowledge Base Stats");
    println!("==================================");
    println!();
    println!("  Database:      {}", config.db.path.display());
    println!("  Size:          {}", format_bytes(db_size));
    println!();
    println!(
        "  Articles:      {} ({} public)",
        stats.articles, stats.public_articles
    );
    println!("  Views:         {}", stats.total_views);
    println!();
    println!("  Interactions:  {}", stats.interactions);
    match stats.avg_confidence {
        Some(c) => println!("  Confidence:    {:.2} avg", c),
        None => println!("  Confidence:    n/a"),
    }
    println!(
        "  No results:    {} ({}%)",
        stats.zero_result_interactions,
        stats.zero_result_pct()
    );
    let last = match stats.last_interaction_ts {
        Some(ts) => format_ts_relative(ts),
        None => "never".to_string(),
    };
    println!("  Last asked:    {}", last);

    if !stats.by_type.is_empty() {
        println!();
        println!("  By response type:");
        println!("  {:<12} {:>8} {:>12}", "TYPE", "COUNT", "CONFIDENCE");
        println!("  {}", "-".repeat(34));
        for t in &stats.by_type {
            println!(
                "  {:<12} {:>8} {:>12.2}",
                t.response_type, t.count, t.avg_confidence
            );
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
