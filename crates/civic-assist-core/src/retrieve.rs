//! Lexical retriever.
//!
//! Selects public articles whose title or body contains the query text
//! (case-insensitive substring), or that carry a tag equal to the query
//! (case-insensitive, whole tag). Results are ordered by `priority_score`
//! descending and capped at the caller's limit.
//!
//! # Edge cases
//!
//! - A blank or whitespace-only query matches nothing. Substring matching
//!   against the empty string would otherwise select every article.
//! - Leading and trailing whitespace is ignored; inner whitespace is part
//!   of the phrase being matched.
//! - A store failure yields an empty candidate list. Retrieval problems
//!   never abort an assistant turn.

use crate::models::{Article, RetrievalCandidate};
use crate::store::ArticleStore;

/// Default number of candidates per turn.
pub const DEFAULT_LIMIT: usize = 5;

/// A normalized retrieval query: the matching predicate handed to stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleQuery {
    text: String,
    needle: String,
}

impl ArticleQuery {
    /// Returns `None` for blank input.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            text: trimmed.to_string(),
            needle: trimmed.to_lowercase(),
        })
    }

    /// The trimmed query as supplied.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The lower-cased query the predicate compares against.
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Whether `article` satisfies the lexical predicate. Visibility is not
    /// considered here; see [`is_eligible`](Self::is_eligible).
    pub fn matches(&self, article: &Article) -> bool {
        article.title.to_lowercase().contains(&self.needle)
            || article.body.to_lowercase().contains(&self.needle)
            || article
                .tags
                .iter()
                .any(|t| t.trim().to_lowercase() == self.needle)
    }

    /// Public and matching.
    pub fn is_eligible(&self, article: &Article) -> bool {
        article.is_public && self.matches(article)
    }
}

/// Retrieve up to `limit` candidates for `query` from `store`.
pub async fn retrieve<S: ArticleStore + ?Sized>(
    store: &S,
    query: &str,
    limit: usize,
) -> Vec<RetrievalCandidate> {
    let Some(q) = ArticleQuery::new(query) else {
        return Vec::new();
    };
    if limit == 0 {
        return Vec::new();
    }

    let articles = match store.find_public_matching(&q, limit).await {
        Ok(articles) => articles,
        Err(e) => {
            tracing::warn!(error = %e, "knowledge base search failed; continuing without context");
            return Vec::new();
        }
    };

    rank(&q, articles, limit)
}

/// Filter to eligible articles, order by priority (stable), and truncate.
fn rank(q: &ArticleQuery, articles: Vec<Article>, limit: usize) -> Vec<RetrievalCandidate> {
    let mut eligible: Vec<Article> = articles.into_iter().filter(|a| q.is_eligible(a)).collect();
    eligible.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));
    eligible.truncate(limit);

    eligible
        .into_iter()
        .enumerate()
        .map(|(match_rank, article)| RetrievalCandidate {
            article,
            match_rank,
        })
        .collect()
}
