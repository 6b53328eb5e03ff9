//! # Civic Assist CLI (`civic`)
//!
//! The `civic` binary manages the knowledge base, asks the assistant
//! questions from the terminal, and runs the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! civic --config ./config/civic.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `civic init` | Create the SQLite database and run schema migrations |
//! | `civic import <file>` | Upsert `[[articles]]` from a TOML file |
//! | `civic articles` | List public articles |
//! | `civic get <id>` | Show one public article (counts a view) |
//! | `civic search "<query>"` | Show what the retriever would pick |
//! | `civic ask "<query>"` | Run a full assistant turn |
//! | `civic stats` | Knowledge base and usage summary |
//! | `civic forget <session>` | Delete a session's interaction records |
//! | `civic serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use civic_assist::{articles, assistant, config, db, migrate, server, stats};
use civic_assist_core::store::AnalyticsSink;

/// Civic Assist: knowledge-base backed assistant for city services.
#[derive(Parser)]
#[command(name = "civic", version, about = "Civic Assist: knowledge-base backed assistant for city services")]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/civic.toml")]
    config: PathBuf,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Import articles from a TOML file of `[[articles]]` tables.
    ///
    /// Articles are upserted by id; entries without an id get a new UUID.
    Import {
        /// Path to the import file.
        file: PathBuf,
    },

    /// List public articles, highest priority first.
    Articles {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a public article and count the view.
    Get {
        /// Article id.
        id: String,
    },

    /// Run only the retriever for a query.
    Search {
        query: String,
        /// Maximum results (defaults to `[retrieval].limit`).
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Ask the assistant a question.
    Ask {
        query: String,
        /// Session id recorded with the interaction.
        #[arg(long)]
        session: Option<String>,
    },

    /// Show knowledge base and assistant usage statistics.
    Stats,

    /// Delete all interaction records for a session.
    Forget {
        session: String,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "civic_assist=debug,civic_assist_core=debug,tower_http=debug"
    } else {
        "civic_assist=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { file } => {
            articles::run_import(&cfg, &file).await?;
        }
        Commands::Articles { category, limit } => {
            articles::run_list(&cfg, category, limit).await?;
        }
        Commands::Get { id } => {
            articles::run_get(&cfg, &id).await?;
        }
        Commands::Search { query, limit } => {
            articles::run_search(&cfg, &query, limit).await?;
        }
        Commands::Ask { query, session } => {
            assistant::run_ask(&cfg, &query, session).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Forget { session } => {
            let pool = db::connect(&cfg).await?;
            let store = civic_assist::sqlite_store::SqliteStore::new(pool.clone());
            let deleted = store.delete_interactions(&session).await?;
            pool.close().await;
            println!("Deleted {} interaction record(s) for session {}", deleted, session);
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
