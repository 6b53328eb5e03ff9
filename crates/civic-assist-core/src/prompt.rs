//! Context assembler.
//!
//! Turns retrieved articles and the caller's conversation window into the
//! system and user prompts sent to the completion service. Pure: the same
//! inputs always produce byte-identical prompts.

use crate::models::{Article, Turn};

/// Per-article body budget, in characters.
pub const DEFAULT_EXCERPT_CHARS: usize = 500;

const PREAMBLE: &str = "You are a helpful civic assistant AI for a city services platform. You help citizens with:

1. Reporting civic issues (potholes, streetlight outages, garbage collection, etc.)
2. Finding information about city services and departments
3. Understanding municipal processes and procedures
4. Getting updates on reported issues
5. General civic engagement and community information

Guidelines:
- Be helpful, accurate, and concise
- If you don't know something, say so and suggest who to contact
- For issue reporting, gather location, description, and urgency
- Provide specific department contact information when available
- Be empathetic to citizen concerns
- Suggest next steps or actions when appropriate";

const CLOSING: &str = "Always provide helpful, accurate information based on the knowledge available to you. If you're uncertain about specific policies or procedures, recommend contacting the appropriate city department directly.";

/// The assembled prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Prompt builder with a configurable excerpt budget.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    excerpt_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }
}

impl PromptBuilder {
    pub fn new(excerpt_chars: usize) -> Self {
        Self { excerpt_chars }
    }

    pub fn build(&self, candidates: &[Article], window: &[Turn], query: &str) -> Prompt {
        Prompt {
            system: self.system_prompt(candidates),
            user: user_prompt(window, query),
        }
    }

    /// Preamble, then the article block (only when there are candidates),
    /// then the closing instruction.
    pub fn system_prompt(&self, candidates: &[Article]) -> String {
        let mut out = String::from(PREAMBLE);
        out.push_str("\n\n");

        if !candidates.is_empty() {
            out.push_str("Relevant knowledge base articles:\n");
            let blocks: Vec<String> = candidates
                .iter()
                .map(|a| {
                    format!(
                        "Title: {}\nContent: {}\nCategory: {}",
                        a.title,
                        excerpt(&a.body, self.excerpt_chars),
                        a.category
                    )
                })
                .collect();
            out.push_str(&blocks.join("\n\n"));
            out.push_str("\n\n");
        }

        out.push_str(CLOSING);
        out
    }
}

/// Build prompts with the default excerpt budget.
pub fn build_prompt(candidates: &[Article], window: &[Turn], query: &str) -> Prompt {
    PromptBuilder::default().build(candidates, window, query)
}

/// The bare query when there is no history; otherwise the rendered
/// conversation followed by the current question.
pub fn user_prompt(window: &[Turn], query: &str) -> String {
    if window.is_empty() {
        return query.to_string();
    }

    let history: Vec<String> = window
        .iter()
        .map(|t| format!("{}: {}", t.role, t.content))
        .collect();

    format!(
        "Previous conversation:\n{}\n\nCurrent question: {}",
        history.join("\n"),
        query
    )
}

/// First `max_chars` characters of `body` followed by `...`.
///
/// The marker is written whether or not the body was cut.
pub fn excerpt(body: &str, max_chars: usize) -> String {
    let end = body
        .char_indices()
        .nth(max_chars)
        .map_or(body.len(), |(byte_idx, _)| byte_idx);
    format!("{}...", &body[..end])
}
