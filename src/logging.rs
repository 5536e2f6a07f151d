//! Tracing subscriber setup.
//!
//! Log output always goes to stderr: on the stdio transport, stdout is the
//! protocol channel and must carry nothing else.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Picks the log level from CLI verbosity flags, falling back to `configured`.
///
/// `-q` wins over everything; each `-v` raises the level one step from INFO.
#[must_use]
pub const fn level_from_verbosity(verbose: u8, quiet: bool, configured: Level) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => configured,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs the global stderr subscriber.
///
/// A non-empty, valid `RUST_LOG` takes precedence; otherwise everything at
/// `level` and above is logged. Returns `false` if a subscriber was already
/// installed, in which case the existing one is left in place.
pub fn init(level: Level) -> bool {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(directives.as_deref(), level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

fn build_filter(directives: Option<&str>, level: Level) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(level.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn rust_log_takes_precedence() {
        let filter = build_filter(Some("trace"), Level::WARN);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));

        let filter = build_filter(Some("error"), Level::DEBUG);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));
    }

    #[test]
    fn level_applies_without_rust_log() {
        let filter = build_filter(None, Level::WARN);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

        let filter = build_filter(Some("  "), Level::DEBUG);
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(level_from_verbosity(3, true, Level::DEBUG), Level::ERROR);
    }

    #[test]
    fn verbosity_steps() {
        assert_eq!(level_from_verbosity(0, false, Level::WARN), Level::WARN);
        assert_eq!(level_from_verbosity(1, false, Level::WARN), Level::INFO);
        assert_eq!(level_from_verbosity(2, false, Level::WARN), Level::DEBUG);
        assert_eq!(level_from_verbosity(9, false, Level::WARN), Level::TRACE);
    }

    #[test]
    fn init_is_idempotent() {
        init(Level::WARN);
        assert!(!init(Level::DEBUG));
    }
}
