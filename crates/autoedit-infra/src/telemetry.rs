//! Tracing subscriber setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "autoedit=debug,tower_http=debug";

/// Install the global subscriber.
///
/// `RUST_LOG` overrides [`DEFAULT_FILTER`]. `json_output` switches from the
/// human-readable format to JSON lines.
pub fn init_telemetry(
    environment: &str,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if json_output {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }

    tracing::info!(environment = %environment, json_output, "Tracing initialized");
    Ok(())
}
