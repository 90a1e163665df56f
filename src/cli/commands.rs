//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "postrag")]
#[command(about = "Grounded answers over community posts")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: level from config)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file (default: config.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (default: server.host from config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (default: server.port from config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable CORS
        #[arg(long)]
        cors: bool,
    },
    /// Ask a question once and print the grounded answer
    Ask {
        /// The question to ask
        question: String,
        /// Number of reference posts to use
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Print the raw JSON payload
        #[arg(long)]
        json: bool,
    },
    /// List the current candidate pool (newest global posts)
    Recent {
        /// Maximum number of posts
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Initialize the database schema
    Init {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Show current configuration
    Config,
}
