//! Global `tracing` subscriber setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::BrookError;

pub const LOG_FILTER_ENV: &str = "BROOK_LOG";
pub const DEFAULT_LOG_FILTER: &str = "brook=info,bchat=info,bprovider=warn";

/// Installs a formatted subscriber filtered by `filter` (`EnvFilter` directive syntax).
///
/// Fails when the directive does not parse or a global subscriber is already installed.
pub fn init_logging(filter: &str) -> Result<(), BrookError> {
    let filter = EnvFilter::try_new(filter)
        .map_err(|err| BrookError::logging(format!("invalid log filter '{filter}': {err}")))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .map_err(|err| BrookError::logging(err.to_string()))
}

/// Same as [`init_logging`], reading the directive from `BROOK_LOG` when set.
pub fn init_logging_from_env() -> Result<(), BrookError> {
    let filter =
        std::env::var(LOG_FILTER_ENV).unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    init_logging(&filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BrookErrorKind;

    #[test]
    fn second_installation_is_reported() {
        let first = init_logging("warn");
        let second = init_logging("warn");

        // Other tests in this binary may have installed one already.
        let _ = first;
        let error = second.expect_err("second init must fail");
        assert_eq!(error.kind, BrookErrorKind::Logging);
    }
}
