//! Knowledge-base authoring and browsing commands.
//!
//! Articles are authored in a TOML file of `[[articles]]` tables and
//! upserted by id. Reading an article for display bumps its view count;
//! retrieving it as assistant context does not.
//!
//! ```toml
//! [[articles]]
//! id = "kb-pothole"
//! title = "Pothole Repair Process"
//! body = "Report potholes through the 311 app..."
//! category = "Road Damage"
//! tags = ["pothole", "roads"]
//! priority_score = 80
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use civic_assist_core::models::{Article, ArticleDraft, ArticleFilter};
use civic_assist_core::retrieve::retrieve;
use civic_assist_core::store::ArticleStore;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Deserialize)]
struct ImportFile {
    #[serde(default)]
    articles: Vec<ArticleDraft>,
}

/// Parse an import file into normalized articles stamped with `now`.
pub fn parse_import(content: &str, now: i64) -> Result<Vec<Article>> {
    let file: ImportFile = toml::from_str(content).context("Failed to parse import file")?;
    file.articles
        .into_iter()
        .enumerate()
        .map(|(i, draft)| {
            Article::from_draft(draft, now).with_context(|| format!("articles[{}] is invalid", i))
        })
        .collect()
}

/// Upsert every article in the file at `path`. Returns the count written.
pub async fn import_articles(store: &dyn ArticleStore, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;
    let articles = parse_import(&content, chrono::Utc::now().timestamp())?;

    for article in &articles {
        store.upsert_article(article).await?;
        tracing::debug!(article_id = %article.id, title = %article.title, "article upserted");
    }
    Ok(articles.len())
}

/// Fetch a public article for display and count the view.
///
/// Private and missing articles both yield `None`.
pub async fn view_article(store: &dyn ArticleStore, id: &str) -> Result<Option<Article>> {
    let mut article = match store.get_article(id).await? {
        Some(a) if a.is_public => a,
        _ => return Ok(None),
    };
    if store.increment_view_count(id).await? {
        article.view_count += 1;
    }
    Ok(Some(article))
}

pub async fn run_import(config: &Config, path: &Path) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let count = import_articles(&store, path).await?;
    pool.close().await;

    println!("Imported {} article(s) from {}", count, path.display());
    Ok(())
}

pub async fn run_list(config: &Config, category: Option<String>, limit: Option<usize>) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let articles = store.list_articles(&ArticleFilter { category, limit }).await?;
    pool.close().await;

    if articles.is_empty() {
        println!("No articles.");
        return Ok(());
    }

    println!(
        "{:<38} {:>4} {:>6}  {:<18} TITLE",
        "ID", "PRIO", "VIEWS", "CATEGORY"
    );
    println!("{}", "-".repeat(96));
    for a in &articles {
        println!(
            "{:<38} {:>4} {:>6}  {:<18} {}",
            a.id, a.priority_score, a.view_count, a.category, a.title
        );
    }
    Ok(())
}

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let article = view_article(&store, id).await?;
    pool.close().await;

    let Some(a) = article else {
        anyhow::bail!("article not found: {}", id);
    };

    println!("{}", a.title);
    println!("{}", "=".repeat(a.title.chars().count()));
    println!("id:        {}", a.id);
    println!("category:  {}", a.category);
    if !a.tags.is_empty() {
        println!("tags:      {}", a.tags.join(", "));
    }
    if let Some(url) = &a.source_url {
        println!("source:    {}", url);
    }
    println!("priority:  {}", a.priority_score);
    println!("views:     {}", a.view_count);
    println!();
    println!("{}", a.body);
    Ok(())
}

/// `civic search`: run only the retriever and print the ranked candidates.
pub async fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let limit = limit.unwrap_or(config.retrieval.limit);
    let candidates = retrieve(&store, query, limit).await;
    pool.close().await;

    if candidates.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for c in &candidates {
        println!(
            "{}. [{}] {} ({})",
            c.match_rank + 1,
            c.article.priority_score,
            c.article.title,
            c.article.category
        );
        println!("   id: {}", c.article.id);
    }
    Ok(())
}
