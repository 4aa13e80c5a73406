use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize tracing for the CLI.
///
/// `RUST_LOG` wins over `default_level`. Logs go to stderr so command output
/// on stdout stays clean; `json` switches to structured JSON lines.
pub fn init_telemetry(default_level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::debug!("jira-cli telemetry initialized");
    Ok(())
}

/// Map `-v` repetitions onto a level, falling back to the configured one.
pub fn level_for_verbosity(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Generate a correlation ID for linking the logs of one invocation
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping a whole CLI command.
pub fn command_span(command: &str, correlation_id: &str) -> tracing::Span {
    tracing::info_span!(
        "command",
        command = command,
        correlation.id = correlation_id
    )
}
