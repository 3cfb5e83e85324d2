//! Logging setup for the binary.

use clap::ValueEnum;

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Install the global fmt subscriber.
///
/// `COINLAB_LOG` takes precedence over `log_level`. Logs go to stderr so
/// reports on stdout stay clean.
pub fn init_tracing(log_level: &str, format: LogFormat) -> Result<(), String> {
    let filter = std::env::var("COINLAB_LOG").unwrap_or_else(|_| log_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
    }
    Ok(())
}
