//! Log output for the server.
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber.
///
/// Filtering follows `RUST_LOG` and defaults to `info`. Records from the
/// `log` facade used by the library crates are forwarded as tracing events.
pub fn init() -> anyhow::Result<()> {
    LogTracer::init()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
