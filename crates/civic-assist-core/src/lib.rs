//! # Civic Assist Core
//!
//! Runtime-agnostic logic for the Civic Assist knowledge-base assistant:
//! the article data model, store and completion traits, and the pure
//! components of an assistant turn.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem dependencies.
//! Persistence and the generative-text service are reached only through
//! the [`store::ArticleStore`], [`store::AnalyticsSink`], and
//! [`completion::CompletionService`] traits.
//!
//! ## Turn Pipeline
//!
//! ```text
//! query ─▶ retrieve ─▶ prompt ─▶ completion ─▶ confidence
//!              │                                   │
//!              └────────▶ recommend ◀──────────────┘
//!                             │
//!                             ▼
//!                       interaction log
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | `Article`, `Turn`, `Recommendation`, `InteractionRecord` |
//! | [`store`] | `ArticleStore` / `AnalyticsSink` traits and the in-memory store |
//! | [`retrieve`] | Lexical retriever (substring + tag match, priority order) |
//! | [`prompt`] | Context assembler for the system and user prompts |
//! | [`completion`] | `CompletionService` trait and request type |
//! | [`confidence`] | Heuristic confidence scorer |
//! | [`classify`] | Response-type classifier |
//! | [`recommend`] | Related-article recommendations |
//! | [`error`] | Turn-level error taxonomy |

pub mod classify;
pub mod completion;
pub mod confidence;
pub mod error;
pub mod models;
pub mod prompt;
pub mod recommend;
pub mod retrieve;
pub mod store;
