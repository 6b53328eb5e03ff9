//! In-memory [`ArticleStore`] and [`AnalyticsSink`] for tests and embedding.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock`. Matching runs the
//! same [`ArticleQuery`] predicate the SQLite store applies, so both
//! backends select identical candidates.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{Article, ArticleFilter, InteractionRecord};
use crate::retrieve::ArticleQuery;

use super::{AnalyticsSink, ArticleStore};

/// In-memory store. Articles are keyed by id; interactions are appended.
pub struct InMemoryStore {
    articles: RwLock<HashMap<String, Article>>,
    interactions: RwLock<Vec<InteractionRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            articles: RwLock::new(HashMap::new()),
            interactions: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of all recorded interactions, in insertion order.
    pub fn interactions(&self) -> Vec<InteractionRecord> {
        self.interactions
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

/// Priority desc, then id asc for a deterministic order among equals.
fn by_priority(a: &Article, b: &Article) -> std::cmp::Ordering {
    b.priority_score
        .cmp(&a.priority_score)
        .then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl ArticleStore for InMemoryStore {
    async fn upsert_article(&self, article: &Article) -> Result<()> {
        let mut articles = self.articles.write().map_err(poisoned)?;
        let mut next = article.clone();
        if let Some(existing) = articles.get(&article.id) {
            next.created_at = existing.created_at;
            next.view_count = existing.view_count;
        }
        articles.insert(next.id.clone(), next);
        Ok(())
    }

    async fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let articles = self.articles.read().map_err(poisoned)?;
        Ok(articles.get(id).cloned())
    }

    async fn delete_article(&self, id: &str) -> Result<bool> {
        let mut articles = self.articles.write().map_err(poisoned)?;
        Ok(articles.remove(id).is_some())
    }

    async fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let articles = self.articles.read().map_err(poisoned)?;
        let mut out: Vec<Article> = articles
            .values()
            .filter(|a| a.is_public)
            .filter(|a| match filter.category.as_deref() {
                Some(cat) => a.category == cat,
                None => true,
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.priority_score
                .cmp(&a.priority_score)
                .then(b.updated_at.cmp(&a.updated_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        if let Some(limit) = filter.limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    async fn find_public_matching(
        &self,
        query: &ArticleQuery,
        limit: usize,
    ) -> Result<Vec<Article>> {
        let articles = self.articles.read().map_err(poisoned)?;
        let mut out: Vec<Article> = articles
            .values()
            .filter(|a| query.is_eligible(a))
            .cloned()
            .collect();
        out.sort_by(by_priority);
        out.truncate(limit);
        Ok(out)
    }

    async fn find_public_by_category(
        &self,
        categories: &[String],
        excluding_ids: &[String],
        limit: usize,
    ) -> Result<Vec<Article>> {
        let articles = self.articles.read().map_err(poisoned)?;
        let mut out: Vec<Article> = articles
            .values()
            .filter(|a| a.is_public)
            .filter(|a| categories.contains(&a.category))
            .filter(|a| !excluding_ids.contains(&a.id))
            .cloned()
            .collect();
        out.sort_by(by_priority);
        out.truncate(limit);
        Ok(out)
    }

    async fn increment_view_count(&self, id: &str) -> Result<bool> {
        let mut articles = self.articles.write().map_err(poisoned)?;
        match articles.get_mut(id) {
            Some(a) => {
                a.view_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl AnalyticsSink for InMemoryStore {
    async fn record_interaction(&self, record: &InteractionRecord) -> Result<()> {
        let mut interactions = self.interactions.write().map_err(poisoned)?;
        interactions.push(record.clone());
        Ok(())
    }

    async fn delete_interactions(&self, session_id: &str) -> Result<u64> {
        let mut interactions = self.interactions.write().map_err(poisoned)?;
        let before = interactions.len();
        interactions.retain(|r| r.session_id.as_deref() != Some(session_id));
        Ok((before - interactions.len()) as u64)
    }
}
