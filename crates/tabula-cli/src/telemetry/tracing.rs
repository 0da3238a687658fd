//! Tracing initialization and configuration.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initializes the tracing subscriber for structured logging.
///
/// The log level is read from `RUST_LOG` and defaults to `info`, which
/// includes every user-facing notice. Log lines go to standard error so that
/// they do not interleave with the rendered listing on standard output.
///
/// ```bash
/// RUST_LOG=tabula_client=debug tabula --role operator
/// ```
///
/// # Errors
///
/// Returns an error if the tracing subscriber fails to initialize.
pub fn init_tracing() -> anyhow::Result<()> {
    let env_filter = create_env_filter()?;
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(())
}

/// Creates an environment filter for tracing.
fn create_env_filter() -> anyhow::Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {e}"))
}
