//! Logging initialization for tailwatch-daemon.
//!
//! Diagnostics go to stderr so they never interleave with console-sink
//! notifications on stdout.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tailwatch_core::config::GeneralConfig;

/// Dependencies that are noisy at debug level.
const QUIET_TARGETS: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustls=warn"];

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
/// `RUST_LOG` takes precedence over `general.log_level`.
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines (default for production)
/// * `"pretty"` - Human-readable multi-line output (for development)
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(&config.log_level));

    let result = match config.log_format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        "pretty" => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        other => {
            return Err(anyhow::anyhow!(
                "unknown log format '{}', expected 'json' or 'pretty'",
                other
            ));
        }
    };

    result.map_err(|e| {
        anyhow::anyhow!(
            "failed to initialize {} tracing subscriber: {}",
            config.log_format,
            e
        )
    })
}

/// Build the level filter: `RUST_LOG` if set, else `level` plus quiet dependency targets.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut directives = vec![level.to_owned()];
        directives.extend(QUIET_TARGETS.iter().map(|t| (*t).to_owned()));
        EnvFilter::new(directives.join(","))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn filter_uses_configured_level_without_rust_log() {
        // SAFETY: serialized with other env-mutating tests
        unsafe { std::env::remove_var("RUST_LOG") };
        let filter = build_filter("debug").to_string();
        assert!(filter.contains("debug"));
        assert!(filter.contains("reqwest=warn"));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let config = GeneralConfig {
            log_format: "xml".to_owned(),
            ..Default::default()
        };
        let err = init_tracing(&config).unwrap_err();
        assert!(err.to_string().contains("xml"));
    }
}
