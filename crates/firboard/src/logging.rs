//! Logging for the board service, the viewer transport and the feed pollers.
//!
//! Per-message chatter from viewer sessions lives in `firboard::server`.
//! At `-v` it is held at info so the board's own debug output stays
//! readable; `-vv` opens everything.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable read by [`init_test_logging`].
#[cfg(test)]
const TEST_LOG_ENV: &str = "FIRBOARD_TEST_LOG";

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Info and above.
    #[default]
    Normal,
    /// Debug for the board, info for viewer sessions.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Map the `-q` and repeated `-v` flags to a level. `-q` wins.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// The level applied to the firboard crate as a whole.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    #[must_use]
    pub fn directives(&self) -> String {
        let crate_level = format!("firboard={}", self.to_level_filter());
        match self {
            Self::Verbose => format!("{crate_level},firboard::server=info"),
            _ => crate_level,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `verbosity` when set; a second call is ignored.
///
/// # Examples
///
/// ```no_run
/// use firboard::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(false, 1));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directives()));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );

    let _ = subscriber.try_init();
}

/// Test logging: firboard warnings only, unless `FIRBOARD_TEST_LOG` holds
/// other directives.
#[cfg(test)]
pub fn init_test_logging() {
    let filter =
        EnvFilter::try_from_env(TEST_LOG_ENV).unwrap_or_else(|_| EnvFilter::new("firboard=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(true, 2), Verbosity::Quiet);
    }

    #[test]
    fn test_verbosity_to_level() {
        assert_eq!(Verbosity::Quiet.to_level_filter(), Level::ERROR);
        assert_eq!(Verbosity::Normal.to_level_filter(), Level::INFO);
        assert_eq!(Verbosity::Verbose.to_level_filter(), Level::DEBUG);
        assert_eq!(Verbosity::Trace.to_level_filter(), Level::TRACE);
    }

    #[test]
    fn test_directives_hold_sessions_at_info_when_verbose() {
        assert_eq!(Verbosity::Normal.directives(), "firboard=INFO");
        assert_eq!(
            Verbosity::Verbose.directives(),
            "firboard=DEBUG,firboard::server=info"
        );
        assert_eq!(Verbosity::Trace.directives(), "firboard=TRACE");
    }

    #[test]
    fn test_directives_parse() {
        for verbosity in [
            Verbosity::Quiet,
            Verbosity::Normal,
            Verbosity::Verbose,
            Verbosity::Trace,
        ] {
            assert!(EnvFilter::try_new(verbosity.directives()).is_ok());
        }
    }

    #[test]
    fn test_init_logging_is_repeatable() {
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Trace);
    }

    #[test]
    fn test_init_test_logging_does_not_panic() {
        init_test_logging();
    }
}
