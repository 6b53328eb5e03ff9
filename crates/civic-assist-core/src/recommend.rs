//! Related-article recommendations.
//!
//! Given the articles used as context for a turn, suggests other public
//! articles from the same categories. Articles already used are excluded by
//! id, so two distinct articles that share a title are still eligible.
//!
//! Similarity is pluggable through [`SimilarityScorer`]; the default
//! [`TagOverlapScorer`] is a pure function of shared tags.

use std::collections::HashSet;

use crate::models::{Article, Recommendation};
use crate::store::ArticleStore;

/// Default number of recommendations per turn.
pub const DEFAULT_LIMIT: usize = 3;

/// Scores how related `candidate` is to the articles already shown.
///
/// Implementations must return a value in `[0, 1]` and be deterministic.
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, used: &[Article], candidate: &Article) -> f64;
}

/// `0.5 + 0.5 × Jaccard(candidate tags, tags of used articles in the same category)`.
///
/// Tags compare case-insensitively. Same-category articles with no shared
/// tags score `0.5`; identical tag sets score `1.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagOverlapScorer;

impl SimilarityScorer for TagOverlapScorer {
    fn score(&self, used: &[Article], candidate: &Article) -> f64 {
        let used_tags: HashSet<String> = used
            .iter()
            .filter(|a| a.category == candidate.category)
            .flat_map(|a| a.tags.iter().map(|t| t.to_lowercase()))
            .collect();
        let cand_tags: HashSet<String> = candidate.tags.iter().map(|t| t.to_lowercase()).collect();

        let union = used_tags.union(&cand_tags).count();
        if union == 0 {
            return 0.5;
        }
        let shared = used_tags.intersection(&cand_tags).count();
        0.5 + 0.5 * (shared as f64 / union as f64)
    }
}

/// Recommend up to `limit` public articles related to `used`.
///
/// Returns an empty list when `used` is empty or the store fails.
pub async fn recommend<S: ArticleStore + ?Sized>(
    store: &S,
    used: &[Article],
    limit: usize,
    scorer: &dyn SimilarityScorer,
) -> Vec<Recommendation> {
    let mut categories: Vec<String> = Vec::new();
    for a in used {
        if !categories.contains(&a.category) {
            categories.push(a.category.clone());
        }
    }
    if categories.is_empty() || limit == 0 {
        return Vec::new();
    }

    let used_ids: Vec<String> = used.iter().map(|a| a.id.clone()).collect();

    let related = match store
        .find_public_by_category(&categories, &used_ids, limit)
        .await
    {
        Ok(related) => related,
        Err(e) => {
            tracing::warn!(error = %e, "recommendation lookup failed; returning none");
            return Vec::new();
        }
    };

    related
        .into_iter()
        .filter(|a| a.is_public && !used_ids.contains(&a.id) && categories.contains(&a.category))
        .take(limit)
        .map(|a| Recommendation {
            similarity_score: scorer.score(used, &a).clamp(0.0, 1.0),
            summary: a.display_summary().to_string(),
            article_id: a.id,
            title: a.title,
            category: a.category,
        })
        .collect()
}
