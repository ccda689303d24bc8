//! Logging initialization and configuration.

use anyhow::Result;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{log_dir_path, Config};

/// Initialize the logging system based on configuration: a daily rolling
/// file in the log directory plus a stdout layer.
pub fn init_logging(cfg: &Config) -> Result<()> {
    let level = parse_log_level(&cfg.log.level)?;

    let log_dir = log_dir_path(cfg);
    std::fs::create_dir_all(&log_dir)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("autoposter={level}")));

    let log_file_suffix = match cfg.log.format.to_lowercase().as_str() {
        "json" => "json",
        _ => "log",
    };
    let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("autoposter")
        .filename_suffix(log_file_suffix)
        .build(&log_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create rolling file appender: {}", e))?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    match cfg.log.format.to_lowercase().as_str() {
        "json" => {
            let file_layer = fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()));
            let stdout_layer = fmt::layer()
                .json()
                .with_writer(std::io::stdout)
                .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(stdout_layer)
                .init();
        }
        _ => {
            let file_layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()));
            let stdout_layer = fmt::layer()
                .with_writer(std::io::stdout)
                .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()));
            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(stdout_layer)
                .init();
        }
    }

    // Keep the appender guard alive for the process lifetime.
    std::mem::forget(guard);

    tracing::info!(
        level = %cfg.log.level,
        format = %cfg.log.format,
        dir = %log_dir.display(),
        "Logging initialized"
    );

    Ok(())
}

/// Parse log level string to a tracing level name.
fn parse_log_level(level_str: &str) -> Result<&'static str> {
    match level_str.to_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" => Ok("warn"),
        "error" => Ok("error"),
        _ => anyhow::bail!("Invalid log level: {}", level_str),
    }
}

/// Initialize simple logging for commands that don't load config.
pub fn init_simple_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "autoposter=info".into()),
        )
        .init();
}
