use clap::Parser;
use postrag::cli::handle_ask_command;
use postrag::cli::handle_config_command;
use postrag::cli::handle_init_command;
use postrag::cli::handle_recent_command;
use postrag::cli::handle_serve_command;
use postrag::cli::print_error;
use postrag::cli::Cli;
use postrag::cli::Commands;
use postrag::config::AppConfig;
use postrag::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level_override = cli.verbose.then_some("debug");

    let config = match AppConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            postrag::logging::init_simple_logging(level_override.unwrap_or("info"))?;
            print_error(&format!("Failed to load configuration: {e}"));
            return Err(e);
        }
    };

    postrag::logging::init_logging(&config.logging, level_override)?;

    match cli.command {
        Commands::Serve { host, port, cors } => {
            handle_serve_command(&config, host, port, cors).await?;
        }
        Commands::Ask {
            question,
            top_k,
            json,
        } => {
            handle_ask_command(&config, question, top_k, json).await?;
        }
        Commands::Recent { limit } => {
            handle_recent_command(&config, limit).await?;
        }
        Commands::Init { force } => {
            handle_init_command(&config, force).await?;
        }
        Commands::Config => {
            handle_config_command(&config)?;
        }
    }

    Ok(())
}
