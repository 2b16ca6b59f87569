use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize a tracing subscriber with default configuration.
///
/// Prints formatted logs to stdout, filtered by the `RUST_LOG` environment
/// variable and defaulting to "info". The engine itself only emits events;
/// hosts that install their own subscriber skip this.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
