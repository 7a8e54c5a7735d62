use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(
                    f,
                    "invalid log level/filter '{}': unable to build EnvFilter",
                    value
                )
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Crates whose events follow the configured level when it is a bare level.
const DIAGNOSTIC_TARGETS: [&str; 2] = ["maturity_diagnostic", "maturity_diagnostic_cli"];

/// Expands a bare level such as `debug` into directives that raise only the
/// diagnostic crates, leaving dependencies at `warn`. Full directive strings pass
/// through untouched.
pub(crate) fn filter_directives(log_level: &str) -> String {
    let level = log_level.trim();
    if level.contains(|c: char| c == '=' || c == ',') {
        return level.to_string();
    }

    DIAGNOSTIC_TARGETS
        .iter()
        .fold(String::from("warn"), |mut directives, target| {
            directives.push_str(&format!(",{target}={level}"));
            directives
        })
}

/// Installs the global subscriber. Logs go to stderr so command output stays clean.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(&config.log_level)).map_err(|source| {
            TelemetryError::EnvFilter {
                value: config.log_level.clone(),
                source,
            }
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::env_guard;

    #[test]
    fn bare_level_is_scoped_to_diagnostic_crates() {
        assert_eq!(
            filter_directives(" debug "),
            "warn,maturity_diagnostic=debug,maturity_diagnostic_cli=debug"
        );
    }

    #[test]
    fn explicit_directives_pass_through() {
        assert_eq!(filter_directives("info,csv=trace"), "info,csv=trace");
        assert_eq!(
            filter_directives("maturity_diagnostic=trace"),
            "maturity_diagnostic=trace"
        );
    }

    #[test]
    fn invalid_filter_is_reported() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        std::env::remove_var("RUST_LOG");
        let config = TelemetryConfig {
            log_level: "info,maturity=loud".to_string(),
        };

        match init(&config) {
            Err(TelemetryError::EnvFilter { value, .. }) => assert_eq!(value, "info,maturity=loud"),
            other => panic!("expected env filter error, got {other:?}"),
        }
    }
}
