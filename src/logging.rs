//! Tracing setup for processes embedding the engine.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Directive used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "flag_keeper=info";

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_filter`. Fails if a global subscriber is
/// already set.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}
