//! Logging setup for fabex.
//!
//! Log output goes to stderr; stdout carries file lists and JSON.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "fabex=info";

/// Initialize logging for fabex.
///
/// An explicit `level` applies to the fabex crates and wins over `RUST_LOG`.
/// Without one, `RUST_LOG` is used, falling back to `fabex=info`.
pub fn init(level: Option<&str>) {
    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn env_filter(level: Option<&str>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::new(format!("fabex={level}")),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}
