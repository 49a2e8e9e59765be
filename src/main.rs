//! Rock Trivia question service.
//!
//! ## Usage
//!
//! ```bash
//! # Serve /api/trivia, /api/questions and /health (port 8788)
//! rock-trivia serve
//!
//! # Custom port and config file
//! rock-trivia --config trivia.toml serve --port 9000
//!
//! # Print ten questions drawn through the configured transport
//! rock-trivia fetch --count 10
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use rock_trivia::{build_cache, server, telemetry, Config};

#[derive(Parser, Debug)]
#[command(name = "rock-trivia")]
#[command(version)]
#[command(about = "Prefetching question service for Rush trivia", long_about = None)]
struct Args {
    /// Configuration file path (overrides TRIVIA_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print questions as JSON
    Fetch {
        /// Number of questions
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    telemetry::init();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    match args.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::serve(config).await.context("Server failed")?;
        }
        Command::Fetch { count } => {
            let cache = build_cache(&config).context("Failed to build transport")?;
            info!(count, "Fetching questions");
            let questions = cache
                .get_questions(count)
                .await
                .context("Failed to fetch trivia questions")?;
            println!("{}", serde_json::to_string_pretty(&questions)?);
        }
    }

    Ok(())
}
