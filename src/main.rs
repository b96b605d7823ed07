//! docroot - sandboxed document browser CLI
//!
//! Runs every gateway operation against a base directory and prints the
//! result as JSON. Failures print the client-safe message and status code,
//! exactly what an HTTP boundary would return.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docroot::config::{self, DocrootConfig};
use docroot::gateway::{
    DocumentService, GatewayError, ListOptions, SearchKind, SortBy, SortOrder,
};
use docroot::logging::init_logging;
use serde::Serialize;
use serde_json::json;

/// docroot - sandboxed document browser
#[derive(Parser, Debug)]
#[command(name = "docroot")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory to serve (overrides DOCROOT_BASE_PATH and the config file)
    #[arg(short, long, global = true)]
    base_path: Option<PathBuf>,

    /// Configuration file (default: ./docroot.toml, then the XDG config dir)
    #[arg(short, long, global = true, env = "DOCROOT_CONFIG")]
    config: Option<PathBuf>,

    /// Also log to stderr (filter with RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a path and print its sandbox-relative form
    Resolve {
        /// Path to resolve
        path: String,
    },

    /// List a directory
    #[command(alias = "ls")]
    List {
        /// Directory path
        #[arg(default_value = "/")]
        path: String,

        /// Include hidden entries
        #[arg(short = 'a', long)]
        hidden: bool,

        /// Sort field: name, size, modified
        #[arg(long, default_value = "name")]
        sort_by: SortBy,

        /// Sort order: asc, desc
        #[arg(long, default_value = "asc")]
        order: SortOrder,
    },

    /// Print one page of a text file
    #[command(alias = "cat")]
    Read {
        /// File path
        path: String,

        /// Page number
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Lines per page (default from config)
        #[arg(short = 'n', long)]
        lines: Option<usize>,
    },

    /// Show file metadata
    Info {
        /// File or directory path
        path: String,
    },

    /// Search file names and contents
    Search {
        /// Search text
        query: String,

        /// What to search: filename, content, both
        #[arg(short = 't', long = "type", default_value = "both")]
        kind: SearchKind,

        /// Limit the search to a directory
        #[arg(short, long)]
        path: Option<String>,

        /// Comma-separated extensions to include
        #[arg(short, long, value_delimiter = ',')]
        ext: Vec<String>,

        /// Maximum results (default from config)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Disable fuzzy filename matching
        #[arg(long)]
        exact: bool,

        /// Minimum fuzzy score (default from config)
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Git queries
    #[command(subcommand)]
    Git(GitCommands),

    /// Start a shell in a directory
    Shell {
        /// Working directory (default: the base)
        path: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum GitCommands {
    /// Repository summary
    Info,

    /// Status of one file
    Status {
        /// File path
        path: String,
    },

    /// Commit history of one file
    History {
        /// File path
        path: String,

        /// Number of commits
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Diff of one file
    Diff {
        /// File path
        path: String,

        /// Commit to compare against (hex hash or HEAD~N)
        #[arg(long)]
        commit: Option<String>,
    },

    /// Changed files below the base
    Changes,
}

fn load_config(cli: &Cli) -> Result<DocrootConfig> {
    let config = match &cli.config {
        Some(path) => config::from_path(path)?,
        None => config::load()?,
    };
    Ok(config)
}

/// Prints a result as JSON; errors become `{ error, status }`.
fn emit<T: Serialize>(result: Result<T, GatewayError>) -> Result<ExitCode> {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let body = json!({
                "error": e.public_message(),
                "status": e.http_status(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli).context("failed to load configuration")?;

    let _guard = match init_logging(&config.logging, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("warning: {e}");
            None
        }
    };

    let service = DocumentService::from_config(&config, cli.base_path.as_deref())
        .context("failed to open the base directory")?;

    match cli.command {
        Commands::Resolve { path } => emit(
            service
                .resolve(&path)
                .map(|resolved| json!({ "path": resolved.display_relative() })),
        ),
        Commands::List {
            path,
            hidden,
            sort_by,
            order,
        } => {
            let options = ListOptions::new()
                .with_hidden(hidden)
                .with_sort(sort_by, order);
            emit(service.list_directory(&path, options).await)
        }
        Commands::Read { path, page, lines } => emit(service.read_page(&path, page, lines).await),
        Commands::Info { path } => emit(service.file_info(&path).await),
        Commands::Search {
            query,
            kind,
            path,
            ext,
            limit,
            exact,
            threshold,
        } => {
            let defaults = service.search_options();
            let mut options = defaults
                .clone()
                .with_kind(kind)
                .with_extensions(ext)
                .with_limit(limit.unwrap_or(defaults.limit))
                .with_fuzzy(!exact, threshold.unwrap_or(defaults.fuzzy_threshold));
            if let Some(scope) = path {
                options = options.with_scope(scope);
            }
            emit(service.search(&query, options).await)
        }
        Commands::Git(git) => match git {
            GitCommands::Info => emit(service.git_info().await),
            GitCommands::Status { path } => emit(service.git_status(&path).await),
            GitCommands::History { path, limit } => emit(service.git_history(&path, limit).await),
            GitCommands::Diff { path, commit } => {
                emit(service.git_diff(&path, commit.as_deref()).await)
            }
            GitCommands::Changes => emit(service.git_changes().await),
        },
        Commands::Shell { path } => match service.terminal(path.as_deref()).await {
            Ok(mut shell) => {
                let status = shell.status().await.context("failed to start shell")?;
                let code = status.code().and_then(|c| u8::try_from(c).ok()).unwrap_or(1);
                Ok(ExitCode::from(code))
            }
            Err(e) => emit::<()>(Err(e)),
        },
    }
}
