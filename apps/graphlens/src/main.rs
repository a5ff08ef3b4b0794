//! # GraphLens - Graph Exploration Server
//!
//! The main binary for GraphLens.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for inspecting and running query sets
//! - Neo4j store adapter over the HTTP Query API
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                 apps/graphlens (THE BINARY)                │
//! │                                                            │
//! │  ┌─────────────┐    ┌─────────────┐    ┌───────────────┐   │
//! │  │    CLI      │    │  HTTP API   │    │ Neo4j adapter │   │
//! │  │   (clap)    │    │   (axum)    │    │   (reqwest)   │   │
//! │  └──────┬──────┘    └──────┬──────┘    └───────┬───────┘   │
//! │         │                  │                   │           │
//! │         └──────────────────┼───────────────────┘           │
//! │                            ▼                               │
//! │                   ┌────────────────┐                       │
//! │                   │ graphlens-core │                       │
//! │                   │  (THE ENGINE)  │                       │
//! │                   └────────────────┘                       │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! graphlens --config graphlens.toml server --host 0.0.0.0 --port 8000
//!
//! # CLI operations
//! graphlens queries
//! graphlens run account_graph -P name=Acme
//! graphlens check --connect
//! ```

use clap::Parser;
use graphlens::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // GRAPHLENS_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("GRAPHLENS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "graphlens=info,graphlens_core=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the GraphLens startup banner.
fn print_banner() {
    println!(
        r#"
   ___               _    _
  / __|_ _ __ _ _ __| |_ | |   ___ _ _  ___
 | (_ | '_/ _` | '_ \ ' \| |__/ -_) ' \(_-<
  \___|_| \__,_| .__/_||_|____\___|_||_/__/
               |_|

  Graph Exploration Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
