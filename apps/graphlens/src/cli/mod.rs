//! # GraphLens CLI Module
//!
//! This module implements the CLI interface for GraphLens.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `queries` - List enabled query sets
//! - `run` - Run one query set against the store and print the result
//! - `check` - Validate settings and the query registry

mod commands;

use clap::{Parser, Subcommand};
use graphlens_core::{GraphLensError, QueryKind};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// GraphLens - declarative graph exploration server
///
/// Runs named, pre-authored Cypher queries and projects their results into
/// renderer-ready graphs, tables and charts.
#[derive(Parser, Debug)]
#[command(name = "graphlens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the query registry (overrides `queries_file_path`)
    #[arg(short = 'Q', long, global = true)]
    pub queries: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// List enabled query sets
    Queries,

    /// Run a query set against the store
    Run {
        /// Query set name
        query_set: String,

        /// Query kind (primary, neighbors, table, chart)
        #[arg(short, long, default_value = "primary")]
        kind: QueryKind,

        /// Query parameter as key=value (repeatable)
        #[arg(short = 'P', long = "param")]
        params: Vec<String>,
    },

    /// Validate settings and the query registry
    Check {
        /// Also open and verify a store connection
        #[arg(long)]
        connect: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), GraphLensError> {
    let settings = load_settings(cli.config.as_deref(), cli.queries)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&settings, &host, port).await,
        Some(Commands::Queries) | None => cmd_queries(&settings, json_mode),
        Some(Commands::Run {
            query_set,
            kind,
            params,
        }) => cmd_run(&settings, json_mode, query_set, kind, &params).await,
        Some(Commands::Check { connect }) => cmd_check(&settings, json_mode, connect).await,
    }
}
