//! Core data models for the knowledge base and assistant turns.
//!
//! Articles are the only persisted content type read by the assistant.
//! Turns, candidates, and completions live for one request; interaction
//! records are appended to the analytics sink after each turn.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest accepted `priority_score`.
pub const MIN_PRIORITY: i64 = 0;
/// Highest accepted `priority_score`.
pub const MAX_PRIORITY: i64 = 100;

/// A knowledge-base article as stored by an [`ArticleStore`](crate::store::ArticleStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Opaque unique identifier (UUIDv4 for generated ids). Immutable.
    pub id: String,
    pub title: String,
    pub body: String,
    /// Short description; [`Article::display_summary`] falls back to the title.
    pub summary: Option<String>,
    pub category: String,
    /// Free-text keywords, sorted and de-duplicated.
    pub tags: Vec<String>,
    pub source_url: Option<String>,
    pub author_id: Option<String>,
    /// Only public articles are eligible for retrieval and recommendation.
    pub is_public: bool,
    /// Caller-assigned ranking boost in `[0, 100]`.
    pub priority_score: i64,
    /// Incremented on each read-for-display, never on retrieval.
    pub view_count: i64,
    /// Unix timestamp (seconds).
    pub created_at: i64,
    /// Unix timestamp (seconds).
    pub updated_at: i64,
}

impl Article {
    /// Summary text, or the title when no summary was authored.
    pub fn display_summary(&self) -> &str {
        match self.summary.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => &self.title,
        }
    }

    /// Build an article from an authoring draft.
    ///
    /// Trims text fields, collapses duplicate tags, clamps the priority
    /// score into `[0, 100]`, and generates an id when the draft has none.
    /// Rejects drafts with an empty title or category.
    pub fn from_draft(draft: ArticleDraft, now: i64) -> Result<Self> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            bail!("article title must not be empty");
        }
        let category = draft.category.trim().to_string();
        if category.is_empty() {
            bail!("article category must not be empty (title: {})", title);
        }

        let id = match draft.id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };

        Ok(Self {
            id,
            title,
            body: draft.body,
            summary: draft.summary.filter(|s| !s.trim().is_empty()),
            category,
            tags: normalize_tags(draft.tags),
            source_url: draft.source_url.filter(|u| !u.trim().is_empty()),
            author_id: draft.author_id,
            is_public: draft.is_public,
            priority_score: clamp_priority(draft.priority_score),
            view_count: 0,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Authoring input for a new or edited article.
///
/// This is the shape of `[[articles]]` entries in an import file.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub summary: Option<String>,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default)]
    pub priority_score: i64,
}

fn default_public() -> bool {
    true
}

/// Trim, drop empties, sort, and de-duplicate a tag list.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

pub fn clamp_priority(score: i64) -> i64 {
    score.clamp(MIN_PRIORITY, MAX_PRIORITY)
}

/// Catalog browse filter (public articles only).
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

/// One prior exchange in the caller-supplied conversation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: String,
    pub content: String,
}

impl Turn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// An article selected by the retriever for the current turn.
#[derive(Debug, Clone)]
pub struct RetrievalCandidate {
    pub article: Article,
    /// Zero-based position in the retriever's output.
    pub match_rank: usize,
}

/// Generated text plus its heuristic confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    /// Computed by [`crate::confidence::score`], in `[0, 1]`.
    pub confidence: f64,
}

/// A related article surfaced alongside the answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    #[serde(rename = "id")]
    pub article_id: String,
    pub title: String,
    pub summary: String,
    pub category: String,
    pub similarity_score: f64,
}

/// Presentation hint derived from the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Map,
    Chart,
    Timeline,
    Text,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Map => "map",
            ResponseType::Chart => "chart",
            ResponseType::Timeline => "timeline",
            ResponseType::Text => "text",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "map" => Some(ResponseType::Map),
            "chart" => Some(ResponseType::Chart),
            "timeline" => Some(ResponseType::Timeline),
            "text" => Some(ResponseType::Text),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance entry: an article that was used as context for a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: String,
    pub title: String,
}

/// Append-only analytics record written once per completed turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionRecord {
    pub id: String,
    pub session_id: Option<String>,
    pub query_text: String,
    pub response_text: String,
    pub confidence: f64,
    pub response_time_ms: u64,
    pub result_count: usize,
    pub has_results: bool,
    pub sources: Vec<SourceRef>,
    pub response_type: ResponseType,
    pub response_length: usize,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}

impl InteractionRecord {
    /// The search-context blob stored next to the record.
    pub fn context_json(&self) -> serde_json::Value {
        serde_json::json!({
            "response_type": self.response_type.as_str(),
            "response_length": self.response_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> ArticleDraft {
        ArticleDraft {
            id: None,
            title: title.to_string(),
            body: "Body".to_string(),
            summary: None,
            category: "Road Damage".to_string(),
            tags: vec![],
            source_url: None,
            author_id: None,
            is_public: true,
            priority_score: 50,
        }
    }

    #[test]
    fn test_from_draft_generates_id_and_timestamps() {
        let a = Article::from_draft(draft("  Pothole Repair  "), 1_700_000_000).unwrap();
        assert_eq!(a.title, "Pothole Repair");
        assert!(uuid::Uuid::parse_str(&a.id).is_ok());
        assert_eq!(a.created_at, 1_700_000_000);
        assert_eq!(a.updated_at, 1_700_000_000);
        assert_eq!(a.view_count, 0);
    }

    #[test]
    fn test_from_draft_keeps_explicit_id() {
        let mut d = draft("Streetlights");
        d.id = Some("kb-streetlights".to_string());
        let a = Article::from_draft(d, 0).unwrap();
        assert_eq!(a.id, "kb-streetlights");
    }

    #[test]
    fn test_from_draft_rejects_empty_title() {
        assert!(Article::from_draft(draft("   "), 0).is_err());
    }

    #[test]
    fn test_from_draft_rejects_empty_category() {
        let mut d = draft("Garbage");
        d.category = " ".to_string();
        assert!(Article::from_draft(d, 0).is_err());
    }

    #[test]
    fn test_priority_clamped() {
        let mut d = draft("High");
        d.priority_score = 250;
        assert_eq!(Article::from_draft(d, 0).unwrap().priority_score, 100);

        let mut d = draft("Low");
        d.priority_score = -4;
        assert_eq!(Article::from_draft(d, 0).unwrap().priority_score, 0);
    }

    #[test]
    fn test_tags_collapsed() {
        let tags = normalize_tags(vec![
            "pothole".into(),
            " road ".into(),
            "pothole".into(),
            "".into(),
        ]);
        assert_eq!(tags, vec!["pothole".to_string(), "road".to_string()]);
    }

    #[test]
    fn test_display_summary_falls_back_to_title() {
        let mut a = Article::from_draft(draft("Water Main Breaks"), 0).unwrap();
        assert_eq!(a.display_summary(), "Water Main Breaks");
        a.summary = Some("How breaks are triaged".to_string());
        assert_eq!(a.display_summary(), "How breaks are triaged");
    }

    #[test]
    fn test_response_type_round_trip_names() {
        for rt in [
            ResponseType::Map,
            ResponseType::Chart,
            ResponseType::Timeline,
            ResponseType::Text,
        ] {
            assert_eq!(ResponseType::parse(rt.as_str()), Some(rt));
        }
        assert_eq!(ResponseType::parse("video"), None);
    }

    #[test]
    fn test_recommendation_serializes_id_and_snake_case() {
        let rec = Recommendation {
            article_id: "a1".into(),
            title: "T".into(),
            summary: "S".into(),
            category: "C".into(),
            similarity_score: 0.75,
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["id"], "a1");
        assert_eq!(v["similarity_score"], 0.75);
    }
}
