//! Tracing subscriber setup
//!
//! Library code only emits `tracing` events; the host process decides where
//! they go. [`init_tracing`] installs a `fmt` subscriber filtered by
//! `RUST_LOG`, falling back to the given directive.

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Output format for [`init_tracing_with`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Install a global `fmt` subscriber with human-readable output.
///
/// Returns `false` when a global subscriber was already installed; calling it
/// more than once is harmless.
pub fn init_tracing(default_filter: &str) -> bool {
    init_tracing_with(default_filter, LogFormat::Pretty)
}

/// Install a global `fmt` subscriber in the given format.
pub fn init_tracing_with(default_filter: &str, format: LogFormat) -> bool {
    let filter = build_filter(default_filter);
    let builder = fmt().with_env_filter(filter).with_target(true);

    let installed = match format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };

    if installed {
        tracing::debug!(?format, "tracing initialised");
    }
    installed
}

fn build_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        let _ = init_tracing("debug");
        assert!(!init_tracing("debug"));
        assert!(!init_tracing_with("info", LogFormat::Json));
    }

    #[test]
    fn invalid_directive_falls_back() {
        let filter = build_filter("distrack=[[[");
        assert!(!filter.to_string().is_empty());
    }
}
