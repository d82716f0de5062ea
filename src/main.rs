//! # ragdesk CLI
//!
//! ## Usage
//!
//! ```bash
//! ragdesk [--config ./config/ragdesk.toml] [--verbose] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragdesk ask "<query>" <paths>...` | Ingest files and print one answer |
//! | `ragdesk chat <paths>...` | Ingest files and answer questions from stdin |
//! | `ragdesk status <paths>...` | Ingest files and print counts per file |
//! | `ragdesk serve` | Start the HTTP server |
//! | `ragdesk completions <shell>` | Print shell completions |
//!
//! Logs go to stderr; set `RUST_LOG` to override the default filter.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use ragdesk::config::{self, Config};
use ragdesk::{ask, server, status};

const DEFAULT_CONFIG_PATH: &str = "./config/ragdesk.toml";

/// ragdesk: ask questions of your own text documents.
#[derive(Parser)]
#[command(
    name = "ragdesk",
    version,
    about = "Ask questions of your own text documents",
    long_about = "ragdesk splits text documents into overlapping chunks, indexes them \
    for similarity search (TF-IDF or local dense embeddings), and answers questions \
    by listing the most relevant passages. No text is generated."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/ragdesk.toml`; built-in defaults are used when
    /// that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest files and print the answer to one question.
    Ask {
        /// The question.
        query: String,

        /// Files or directories to search.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Ingest files, then answer one question per line of stdin.
    ///
    /// `:status` prints counts, `:reset` clears the session and `:quit`
    /// exits.
    Chat {
        /// Files or directories to search.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Ingest files and show what was indexed.
    Status {
        /// Files or directories to ingest.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Print shell completion script to stdout.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "ragdesk=debug,ragdesk_core=debug"
    } else {
        "ragdesk=info,ragdesk_core=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => config::load_config(path),
        None => config::load_config_or_default(Path::new(DEFAULT_CONFIG_PATH)),
    }
}

/// Run a synchronous command off the async executor.
///
/// Session work may load an embedding model, which does its own blocking
/// network I/O on first use.
async fn blocking<F>(f: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "ragdesk", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(cli.verbose);
    let cfg = load_config(&cli)?;

    match cli.command {
        Commands::Ask { query, paths } => {
            blocking(move || ask::run_ask(&cfg, &query, &paths)).await?;
        }
        Commands::Chat { paths } => {
            blocking(move || ask::run_chat(&cfg, &paths)).await?;
        }
        Commands::Status { paths } => {
            blocking(move || status::run_status(&cfg, &paths)).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
