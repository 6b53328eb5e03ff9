//! SQLite-backed [`ArticleStore`] and [`AnalyticsSink`].
//!
//! Rows are validated as they are read: malformed tag JSON coerces to an
//! empty tag set, priorities are clamped to `[0, 100]`, negative view counts
//! read as zero, and rows without an id or title are skipped with a warning.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use civic_assist_core::models::{clamp_priority, Article, ArticleFilter, InteractionRecord};
use civic_assist_core::retrieve::ArticleQuery;
use civic_assist_core::store::{AnalyticsSink, ArticleStore};

const ARTICLE_COLUMNS: &str = "id, title, body, summary, category, tags_json, source_url, \
     author_id, is_public, priority_score, view_count, created_at, updated_at";

/// SQLite implementation of the store traits over the `articles` and
/// `interactions` tables.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Decode one `articles` row, or `None` if it is unusable.
fn row_to_article(row: &SqliteRow) -> Option<Article> {
    let id: String = match row.try_get("id") {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "skipping article row with unreadable id");
            return None;
        }
    };
    let title: String = match row.try_get("title") {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(article_id = %id, error = %e, "skipping article row without title");
            return None;
        }
    };
    if id.trim().is_empty() || title.trim().is_empty() {
        tracing::warn!(article_id = %id, "skipping article row with empty id or title");
        return None;
    }

    let tags_json: String = row.try_get("tags_json").unwrap_or_default();
    let tags: Vec<String> = match serde_json::from_str(&tags_json) {
        Ok(tags) => tags,
        Err(e) => {
            tracing::warn!(article_id = %id, error = %e, "malformed tags; treating as none");
            Vec::new()
        }
    };

    Some(Article {
        body: row.try_get("body").unwrap_or_default(),
        summary: row.try_get("summary").unwrap_or(None),
        category: row.try_get("category").unwrap_or_default(),
        tags: civic_assist_core::models::normalize_tags(tags),
        source_url: row.try_get("source_url").unwrap_or(None),
        author_id: row.try_get("author_id").unwrap_or(None),
        is_public: row.try_get::<bool, _>("is_public").unwrap_or(false),
        priority_score: clamp_priority(row.try_get("priority_score").unwrap_or(0)),
        view_count: row.try_get::<i64, _>("view_count").unwrap_or(0).max(0),
        created_at: row.try_get("created_at").unwrap_or(0),
        updated_at: row.try_get("updated_at").unwrap_or(0),
        id,
        title,
    })
}

fn rows_to_articles(rows: &[SqliteRow]) -> Vec<Article> {
    rows.iter().filter_map(row_to_article).collect()
}

/// Whether `needle` reads the same to SQLite `lower()` and inside JSON text.
fn sql_prefilterable(needle: &str) -> bool {
    needle
        .bytes()
        .all(|b| (b' '..=b'~').contains(&b) && b != b'"' && b != b'\\')
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[async_trait]
impl ArticleStore for SqliteStore {
    async fn upsert_article(&self, article: &Article) -> Result<()> {
        let tags_json = serde_json::to_string(&article.tags)?;

        sqlx::query(
            r#"
            INSERT INTO articles (id, title, body, summary, category, tags_json, source_url,
                                  author_id, is_public, priority_score, view_count,
                                  created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                summary = excluded.summary,
                category = excluded.category,
                tags_json = excluded.tags_json,
                source_url = excluded.source_url,
                author_id = excluded.author_id,
                is_public = excluded.is_public,
                priority_score = excluded.priority_score,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&article.id)
        .bind(&article.title)
        .bind(&article.body)
        .bind(&article.summary)
        .bind(&article.category)
        .bind(&tags_json)
        .bind(&article.source_url)
        .bind(&article.author_id)
        .bind(article.is_public)
        .bind(clamp_priority(article.priority_score))
        .bind(article.view_count)
        .bind(article.created_at)
        .bind(article.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM articles WHERE id = ?",
            ARTICLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(row_to_article))
    }

    async fn delete_article(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let limit = filter.limit.map(|l| l as i64).unwrap_or(-1);

        let rows = match filter.category.as_deref() {
            Some(category) => {
                sqlx::query(&format!(
                    "SELECT {} FROM articles WHERE is_public = 1 AND category = ? \
                     ORDER BY priority_score DESC, updated_at DESC, id ASC LIMIT ?",
                    ARTICLE_COLUMNS
                ))
                .bind(category)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM articles WHERE is_public = 1 \
                     ORDER BY priority_score DESC, updated_at DESC, id ASC LIMIT ?",
                    ARTICLE_COLUMNS
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows_to_articles(&rows))
    }

    async fn find_public_matching(
        &self,
        query: &ArticleQuery,
        limit: usize,
    ) -> Result<Vec<Article>> {
        // SQLite's lower() folds ASCII only and tags are stored as JSON, so
        // the SQL filter only narrows. Rows holding non-ASCII text always pass
        // it, and the Rust predicate makes the final decision.
        let rows = if sql_prefilterable(query.needle()) {
            sqlx::query(&format!(
                "SELECT {} FROM articles WHERE is_public = 1 AND ( \
                     instr(lower(title), ?) > 0 \
                     OR instr(lower(body), ?) > 0 \
                     OR instr(lower(tags_json), ?) > 0 \
                     OR (title || body || tags_json) GLOB '*[^ -~]*' \
                 ) ORDER BY priority_score DESC, id ASC",
                ARTICLE_COLUMNS
            ))
            .bind(query.needle())
            .bind(query.needle())
            .bind(query.needle())
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(&format!(
                "SELECT {} FROM articles WHERE is_public = 1 ORDER BY priority_score DESC, id ASC",
                ARTICLE_COLUMNS
            ))
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows
            .iter()
            .filter_map(row_to_article)
            .filter(|a| query.is_eligible(a))
            .take(limit)
            .collect())
    }

    async fn find_public_by_category(
        &self,
        categories: &[String],
        excluding_ids: &[String],
        limit: usize,
    ) -> Result<Vec<Article>> {
        if categories.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut sql = format!(
            "SELECT {} FROM articles WHERE is_public = 1 AND category IN ({})",
            ARTICLE_COLUMNS,
            placeholders(categories.len())
        );
        if !excluding_ids.is_empty() {
            sql.push_str(&format!(
                " AND id NOT IN ({})",
                placeholders(excluding_ids.len())
            ));
        }
        sql.push_str(" ORDER BY priority_score DESC, id ASC LIMIT ?");

        let mut q = sqlx::query(&sql);
        for c in categories {
            q = q.bind(c);
        }
        for id in excluding_ids {
            q = q.bind(id);
        }
        let rows = q.bind(limit as i64).fetch_all(&self.pool).await?;

        Ok(rows_to_articles(&rows))
    }

    async fn increment_view_count(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE articles SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AnalyticsSink for SqliteStore {
    async fn record_interaction(&self, record: &InteractionRecord) -> Result<()> {
        let sources_json = serde_json::to_string(&record.sources)?;
        let context_json = record.context_json().to_string();

        sqlx::query(
            r#"
            INSERT INTO interactions (id, session_id, query_text, response_text, confidence,
                                      response_time_ms, result_count, has_results,
                                      sources_json, response_type, context_json, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.session_id)
        .bind(&record.query_text)
        .bind(&record.response_text)
        .bind(record.confidence)
        .bind(record.response_time_ms as i64)
        .bind(record.result_count as i64)
        .bind(record.has_results)
        .bind(&sources_json)
        .bind(record.response_type.as_str())
        .bind(&context_json)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_interactions(&self, session_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM interactions WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
