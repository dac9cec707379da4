use snafu::ResultExt;
use tracing::Subscriber;

use crate::application::data::LogLevel;
use crate::application::{ApplicationError, LoggingSnafu};

/// Builds the stderr subscriber for `level`, or `None` when logging is off.
///
/// Shell output goes to stdout, so diagnostics never interleave with it.
pub fn subscriber(level: LogLevel) -> Option<impl Subscriber + Send + Sync + 'static> {
    let level = level.to_tracing_level()?;
    Some(
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .compact()
            .finish(),
    )
}

/// Installs the process-wide subscriber. Must be called at most once.
pub fn install_logging(level: LogLevel) -> Result<(), ApplicationError> {
    match subscriber(level) {
        Some(subscriber) => {
            tracing::subscriber::set_global_default(subscriber).context(LoggingSnafu)
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use tracing::Level;

    #[test]
    fn silent_installs_nothing() {
        assert!(subscriber(LogLevel::Silent).is_none());
    }

    #[rstest]
    #[case::warn_passes(LogLevel::Warn, || tracing::enabled!(Level::WARN), true)]
    #[case::info_filtered(LogLevel::Warn, || tracing::enabled!(Level::INFO), false)]
    #[case::debug_passes(LogLevel::Debug, || tracing::enabled!(Level::DEBUG), true)]
    #[case::warn_filtered(LogLevel::Error, || tracing::enabled!(Level::WARN), false)]
    fn subscriber_filters_by_level(
        #[case] level: LogLevel,
        #[case] is_enabled: fn() -> bool,
        #[case] expected: bool,
    ) {
        let subscriber = subscriber(level).expect("Level should produce a subscriber");
        let enabled = tracing::subscriber::with_default(subscriber, is_enabled);
        assert_eq!(enabled, expected);
    }
}
