//! Assistant pipeline.
//!
//! One call to [`Assistant::answer`] is one turn:
//!
//! ```text
//! validate ─► retrieve ─► build prompt ─► complete ─► score ─► classify
//!                                                                │
//!                         response ◄── log ◄── recommend ◄───────┘
//! ```
//!
//! Only input validation and the completion call can fail the turn.
//! Retrieval and recommendation degrade to empty lists, and logging is
//! handed to the background [`InteractionLogger`].

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use civic_assist_core::classify::classify;
use civic_assist_core::confidence;
use civic_assist_core::error::AssistError;
use civic_assist_core::models::{Article, InteractionRecord, Recommendation, ResponseType, SourceRef, Turn};
use civic_assist_core::prompt::PromptBuilder;
use civic_assist_core::recommend::{recommend, SimilarityScorer, TagOverlapScorer};
use civic_assist_core::retrieve::retrieve;
use civic_assist_core::store::{AnalyticsSink, ArticleStore};

use crate::analytics::InteractionLogger;
use crate::completion::{create_completion_service, CompletionGateway};
use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Inbound turn payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssistantRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
    /// Prior turns, oldest first.
    #[serde(default)]
    pub context: Vec<Turn>,
}

impl AssistantRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            ..Self::default()
        }
    }
}

/// Article cited as context for an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub title: String,
    /// The article's source URL, or `"#"` when it has none.
    pub url: String,
    pub category: String,
}

impl From<&Article> for Source {
    fn from(a: &Article) -> Self {
        Self {
            title: a.title.clone(),
            url: a.source_url.clone().unwrap_or_else(|| "#".to_string()),
            category: a.category.clone(),
        }
    }
}

/// Outbound turn payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantResponse {
    pub response: String,
    pub confidence: f64,
    pub sources: Vec<Source>,
    pub recommendations: Vec<Recommendation>,
    pub response_type: ResponseType,
    pub response_data: serde_json::Value,
}

/// The assistant turn pipeline with its collaborators injected.
#[derive(Clone)]
pub struct Assistant {
    store: Arc<dyn ArticleStore>,
    gateway: CompletionGateway,
    logger: InteractionLogger,
    scorer: Arc<dyn SimilarityScorer>,
    prompts: PromptBuilder,
    retrieval_limit: usize,
    recommendation_limit: usize,
}

impl Assistant {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        gateway: CompletionGateway,
        logger: InteractionLogger,
    ) -> Self {
        Self {
            store,
            gateway,
            logger,
            scorer: Arc::new(TagOverlapScorer),
            prompts: PromptBuilder::default(),
            retrieval_limit: civic_assist_core::retrieve::DEFAULT_LIMIT,
            recommendation_limit: civic_assist_core::recommend::DEFAULT_LIMIT,
        }
    }

    pub fn with_limits(mut self, retrieval_limit: usize, recommendation_limit: usize) -> Self {
        self.retrieval_limit = retrieval_limit;
        self.recommendation_limit = recommendation_limit;
        self
    }

    pub fn with_excerpt_chars(mut self, excerpt_chars: usize) -> Self {
        self.prompts = PromptBuilder::new(excerpt_chars);
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn SimilarityScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn logger(&self) -> &InteractionLogger {
        &self.logger
    }

    /// Run one assistant turn.
    pub async fn answer(&self, request: AssistantRequest) -> Result<AssistantResponse, AssistError> {
        let started = Instant::now();

        let query = match request.query.as_deref() {
            Some(q) if !q.trim().is_empty() => q,
            _ => return Err(AssistError::InvalidQuery),
        };

        let candidates = retrieve(self.store.as_ref(), query, self.retrieval_limit).await;
        let used: Vec<Article> = candidates.into_iter().map(|c| c.article).collect();
        tracing::debug!(candidates = used.len(), "retrieval complete");

        let prompt = self.prompts.build(&used, &request.context, query);
        let completion = self.gateway.complete(&prompt.system, &prompt.user).await?;

        let confidence = confidence::score(&completion.content, query);
        let response_type = classify(query);

        let recommendations = recommend(
            self.store.as_ref(),
            &used,
            self.recommendation_limit,
            self.scorer.as_ref(),
        )
        .await;

        self.logger.log(InteractionRecord {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: request.session_id.clone(),
            query_text: query.to_string(),
            response_text: completion.content.clone(),
            confidence,
            response_time_ms: started.elapsed().as_millis() as u64,
            result_count: used.len(),
            has_results: !used.is_empty(),
            sources: used
                .iter()
                .map(|a| SourceRef {
                    id: a.id.clone(),
                    title: a.title.clone(),
                })
                .collect(),
            response_type,
            response_length: completion.content.chars().count(),
            created_at: chrono::Utc::now().timestamp(),
        });

        Ok(AssistantResponse {
            sources: used.iter().map(Source::from).collect(),
            response: completion.content,
            confidence,
            recommendations,
            response_type,
            response_data: serde_json::json!({}),
        })
    }
}

/// Wire an [`Assistant`] to the configured SQLite store and completion provider.
pub fn build_assistant(config: &Config, store: SqliteStore) -> Result<Assistant> {
    let service = create_completion_service(&config.completion)?;
    let gateway = CompletionGateway::from_config(service, &config.completion);

    let logger = if config.analytics.enabled {
        let sink: Arc<dyn AnalyticsSink> = Arc::new(store.clone());
        InteractionLogger::spawn(sink, config.analytics.queue_capacity)
    } else {
        InteractionLogger::disabled()
    };

    Ok(Assistant::new(Arc::new(store), gateway, logger)
        .with_limits(config.retrieval.limit, config.retrieval.recommendation_limit)
        .with_excerpt_chars(config.retrieval.excerpt_chars))
}

/// `civic ask`: run one turn and print the answer.
pub async fn run_ask(config: &Config, query: &str, session_id: Option<String>) -> Result<()> {
    let pool = db::connect(config).await?;
    let assistant = build_assistant(config, SqliteStore::new(pool.clone()))?;

    let request = AssistantRequest {
        query: Some(query.to_string()),
        session_id,
        context: Vec::new(),
    };

    let outcome = assistant.answer(request).await;
    let logger = assistant.logger().clone();
    drop(assistant);
    logger.shutdown().await;

    let response = match outcome {
        Ok(response) => response,
        Err(e) => {
            pool.close().await;
            match e.details() {
                Some(details) => anyhow::bail!("{} ({})", e.public_message(), details),
                None => anyhow::bail!("{}", e.public_message()),
            }
        }
    };

    println!("{}", response.response);
    println!();
    println!(
        "confidence: {:.2}    type: {}",
        response.confidence, response.response_type
    );

    if !response.sources.is_empty() {
        println!();
        println!("Sources:");
        for s in &response.sources {
            println!("  - {} [{}] {}", s.title, s.category, s.url);
        }
    }

    if !response.recommendations.is_empty() {
        println!();
        println!("Related:");
        for r in &response.recommendations {
            println!(
                "  - {} ({:.2}) id={}",
                r.title, r.similarity_score, r.article_id
            );
        }
    }

    pool.close().await;
    Ok(())
}
