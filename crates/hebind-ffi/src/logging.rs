//! Subscriber installation for hosts that do not bring their own

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a global fmt subscriber. `RUST_LOG` overrides `default_filter`.
/// Returns false when a subscriber was already installed.
pub fn init(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
