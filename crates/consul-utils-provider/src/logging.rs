//! Logging setup
//!
//! Terraform captures provider stderr and filters it by `TF_LOG_PROVIDER`
//! (falling back to `TF_LOG`). The same variables select the tracing level
//! here, and `RUST_LOG` style directives are accepted as-is.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_DIRECTIVE: &str = "info";

/// Map a Terraform log level to a filter directive.
///
/// `JSON` is Terraform's trace-level JSON output. Anything else is handed to
/// [`EnvFilter`] unchanged.
pub fn directive_for(tf_log: &str) -> String {
    match tf_log.trim().to_ascii_uppercase().as_str() {
        "TRACE" | "JSON" => "trace".to_string(),
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARN" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        "OFF" | "" => "off".to_string(),
        _ => tf_log.trim().to_string(),
    }
}

fn env_directive() -> Option<String> {
    ["TF_LOG_PROVIDER", "TF_LOG"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
        .map(|value| directive_for(&value))
}

fn build_filter(directive: &str, default: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber, using `default` when no Terraform log
/// variable is set
pub fn try_init_logging(default: &str) -> Result<(), TryInitError> {
    let directive = env_directive().unwrap_or_else(|| default.to_string());

    tracing_subscriber::registry()
        .with(build_filter(&directive, default))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
}

/// Install the global subscriber at the default level.
///
/// A subscriber that is already installed is left in place.
pub fn init_logging() {
    if let Err(e) = try_init_logging(DEFAULT_DIRECTIVE) {
        eprintln!("Logging already initialized: {e}");
    }
}
