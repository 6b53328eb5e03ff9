//! # Civic Assist
//!
//! Knowledge-base retrieval and answer generation for a city services
//! assistant. Citizens ask questions; the assistant finds matching public
//! articles, asks a completion service for an answer grounded in them, and
//! returns the answer with a confidence estimate, its sources, and related
//! reading.
//!
//! The turn logic lives in the `civic-assist-core` crate. This crate wires
//! it to SQLite, an OpenAI-compatible completion API, a background
//! analytics writer, an HTTP server, and the `civic` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌────────────────┐
//! │  SQLite  │◀─▶│   Assistant   │──▶│  Completion    │
//! │ articles │   │ retrieve/score│   │  (OpenAI API)  │
//! └────┬─────┘   └───────┬───────┘   └────────────────┘
//!      │                 │ records
//!      │                 ▼
//!      │         ┌───────────────┐
//!      └────────▶│ interactions  │  (background logger)
//!                └───────────────┘
//!                      ▲
//!          ┌───────────┴───────────┐
//!          │  CLI (civic)  │  HTTP │
//!          └───────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! civic init
//! civic import ./kb/articles.toml
//! civic search "pothole"
//! OPENAI_API_KEY=... civic ask "how do I report a pothole"
//! civic serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite article store and analytics sink |
//! | [`completion`] | Completion providers and gateway |
//! | [`analytics`] | Background interaction logger |
//! | [`assistant`] | The assistant turn pipeline |
//! | [`articles`] | Article import, browse, and display |
//! | [`stats`] | Usage summary |
//! | [`server`] | HTTP server |

pub mod analytics;
pub mod articles;
pub mod assistant;
pub mod completion;
pub mod config;
pub mod db;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
pub mod stats;
