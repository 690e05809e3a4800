//! Logging setup for the relay binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are enabled at the default level alongside the binary.
const RELAY_TARGETS: &[&str] = &["engawa_relay", "engawa_shared", "tower_http"];

/// Build the default filter directive, e.g. `engawa_relay=debug,...,server=debug`.
pub fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    RELAY_TARGETS
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The level applies to the relay crates, `tower_http` request spans and the
/// binary itself. `RUST_LOG` overrides the whole directive when set.
///
/// # Examples
///
/// ```no_run
/// use engawa_shared::logger::setup_logger;
///
/// setup_logger("engawa-relay", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
