//! Storage abstraction for Civic Assist.
//!
//! The [`ArticleStore`] trait covers every content-store operation the
//! assistant and the catalog need; [`AnalyticsSink`] is the append-only
//! destination for interaction records. Both are injected into the
//! components that use them, so tests can substitute [`memory::InMemoryStore`]
//! or a deliberately failing store.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Article, ArticleFilter, InteractionRecord};
use crate::retrieve::ArticleQuery;

/// Abstract content store for knowledge-base articles.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_article`](ArticleStore::upsert_article) | Insert or replace an article by id |
/// | [`get_article`](ArticleStore::get_article) | Fetch one article (any visibility) |
/// | [`delete_article`](ArticleStore::delete_article) | Permanently remove an article |
/// | [`list_articles`](ArticleStore::list_articles) | Catalog browse: priority desc, then most recent |
/// | [`find_public_matching`](ArticleStore::find_public_matching) | Retriever read path |
/// | [`find_public_by_category`](ArticleStore::find_public_by_category) | Recommendation read path |
/// | [`increment_view_count`](ArticleStore::increment_view_count) | Atomic view counter bump |
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert a new article or replace the existing one with the same id.
    ///
    /// On replace, `created_at` and `view_count` of the stored article are kept.
    async fn upsert_article(&self, article: &Article) -> Result<()>;

    /// Retrieve an article by id regardless of visibility.
    async fn get_article(&self, id: &str) -> Result<Option<Article>>;

    /// Delete an article. Returns `true` if a row was removed.
    async fn delete_article(&self, id: &str) -> Result<bool>;

    /// Public articles for catalog display, ordered by `priority_score`
    /// descending, then `updated_at` descending.
    async fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>>;

    /// Public articles satisfying `query`, ordered by `priority_score`
    /// descending, at most `limit` of them.
    async fn find_public_matching(&self, query: &ArticleQuery, limit: usize)
        -> Result<Vec<Article>>;

    /// Public articles whose category is in `categories` and whose id is
    /// not in `excluding_ids`, ordered by `priority_score` descending.
    async fn find_public_by_category(
        &self,
        categories: &[String],
        excluding_ids: &[String],
        limit: usize,
    ) -> Result<Vec<Article>>;

    /// Atomically add one to an article's view count.
    ///
    /// Returns `false` if no article has this id.
    async fn increment_view_count(&self, id: &str) -> Result<bool>;
}

/// Append-only destination for [`InteractionRecord`]s.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    async fn record_interaction(&self, record: &InteractionRecord) -> Result<()>;

    /// Remove all records for a session (user data-retention request).
    /// Returns the number of records deleted.
    async fn delete_interactions(&self, session_id: &str) -> Result<u64>;
}
