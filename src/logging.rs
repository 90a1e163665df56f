//! Logging configuration for postrag

use std::path::Path;

use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::LoggingConfig;
use crate::Result;

const LOG_FILE_PREFIX: &str = "postrag.log";

/// Initialize logging from the `[logging]` section, optionally forcing a level
pub fn init_logging(config: &LoggingConfig, level_override: Option<&str>) -> Result<()> {
    let level = level_override.unwrap_or(&config.level);
    let env_filter = build_filter(level);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);

    if config.file_output {
        let logs_dir = Path::new(&config.log_dir);
        if !logs_dir.exists() {
            std::fs::create_dir_all(logs_dir)?;
        }

        let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(non_blocking)
            .with_ansi(false);

        Registry::default()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        // The writer thread must outlive every log call in the process
        std::mem::forget(guard);

        tracing::info!(
            "Logging initialized with level: {} - console and file output ({}/{}.YYYY-MM-DD)",
            level,
            config.log_dir,
            LOG_FILE_PREFIX
        );
    } else {
        Registry::default()
            .with(env_filter)
            .with(console_layer)
            .init();

        tracing::info!("Logging initialized with level: {} - console output", level);
    }

    Ok(())
}

/// Initialize simple stderr logging (CLI runs without a config file, tests)
pub fn init_simple_logging(level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
    Ok(())
}

/// `RUST_LOG` wins when set; otherwise the level applies to everything
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},postrag={level}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_logging_can_be_called_twice() {
        assert!(init_simple_logging("info").is_ok());
        assert!(init_simple_logging("debug").is_ok());
    }
}
