//! Tracing setup for chewtrack binaries.
//!
//! Events go to stderr so that machine-readable output on stdout (for
//! example `analyze --json`) stays clean.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Targets that follow the configured level. Everything else logs warnings only.
const CHEWTRACK_TARGETS: &[&str] = &[
    "chewtrack",
    "chewtrack_common",
    "chewtrack_processing_core",
    "chewtrack_session",
];

/// Filter directive for the configured level.
///
/// A plain level such as `info` applies to the chewtrack crates only. A level
/// that already carries directives (`target=level` or a list) is used as-is.
/// `verbose` raises the chewtrack crates to `debug`.
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    let level = config.level.trim();
    if !verbose && (level.contains('=') || level.contains(',')) {
        return level.to_string();
    }

    let level = match (verbose, level.is_empty()) {
        (true, _) => "debug",
        (false, true) => "info",
        (false, false) => level,
    };
    std::iter::once("warn".to_string())
        .chain(CHEWTRACK_TARGETS.iter().map(|t| format!("{t}={level}")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configuration. Returns `false` if a subscriber was already installed.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config, verbose)));

    let builder = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.with_target(verbose).try_init()
    };
    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logging(level: &str) -> LoggingConfig {
        LoggingConfig {
            level: level.to_string(),
            json: false,
        }
    }

    #[test]
    fn test_plain_level_scopes_to_chewtrack_crates() {
        let directive = filter_directive(&logging("info"), false);
        assert!(directive.starts_with("warn,"));
        assert!(directive.contains("chewtrack_session=info"));
        assert!(directive.contains("chewtrack=info"));
    }

    #[test]
    fn test_custom_directive_is_kept() {
        let level = "chewtrack_processing_core=trace,warn";
        assert_eq!(filter_directive(&logging(level), false), level);
    }

    #[test]
    fn test_verbose_raises_to_debug() {
        let directive = filter_directive(&logging("chewtrack_session=trace"), true);
        assert!(directive.contains("chewtrack_processing_core=debug"));
        assert!(!directive.contains("trace"));
        assert!(filter_directive(&logging(""), false).contains("chewtrack_common=info"));
    }
}
