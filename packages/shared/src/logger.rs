//! Tracing subscriber setup for the TUIO binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are shown at the default level
const LIBRARY_TARGETS: [&str; 2] = ["tuio_server", "tuio_shared"];

/// Filter directives used when `RUST_LOG` is not set.
///
/// Every TUIO crate and the binary itself log at `default_log_level`.
pub fn default_directives(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    let mut targets: Vec<&str> = LIBRARY_TARGETS.to_vec();
    if !targets.contains(&binary_target.as_str()) {
        targets.push(&binary_target);
    }
    targets
        .iter()
        .map(|target| format!("{target}={default_log_level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the defaults from [`default_directives`]. Calling this
/// more than once keeps the first subscriber.
///
/// # Examples
///
/// ```no_run
/// use tuio_shared::logger::setup_logger;
///
/// setup_logger("tuio-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directives(binary_name, default_log_level).into());
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
