use crate::config::ConfigError;
use crate::diagnostic::legacy::LegacyExportError;
use crate::diagnostic::service::DiagnosticServiceError;
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Fixture(serde_json::Error),
    Diagnostic(DiagnosticServiceError),
    Export(LegacyExportError),
    /// Band sets that fail to partition their score range.
    Coverage { defective_scopes: usize },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Fixture(err) => write!(f, "invalid fixture data: {}", err),
            AppError::Diagnostic(err) => write!(f, "diagnostic error: {}", err),
            AppError::Export(err) => write!(f, "legacy export error: {}", err),
            AppError::Coverage { defective_scopes } => write!(
                f,
                "{} band set(s) do not partition their score range",
                defective_scopes
            ),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Fixture(err) => Some(err),
            AppError::Diagnostic(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Coverage { .. } => None,
        }
    }
}

impl AppError {
    /// Process exit code: configuration defects are distinguished from bad input.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Fixture(_) | AppError::Io(_) => 2,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Diagnostic(_)
            | AppError::Export(_)
            | AppError::Coverage { .. } => 1,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Fixture(value)
    }
}

impl From<DiagnosticServiceError> for AppError {
    fn from(value: DiagnosticServiceError) -> Self {
        Self::Diagnostic(value)
    }
}

impl From<LegacyExportError> for AppError {
    fn from(value: LegacyExportError) -> Self {
        Self::Export(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::repository::RepositoryError;

    #[test]
    fn wraps_service_errors_with_context() {
        let err = AppError::from(DiagnosticServiceError::from(RepositoryError::Unavailable(
            "cms offline".to_string(),
        )));

        assert_eq!(
            err.to_string(),
            "diagnostic error: repository unavailable: cms offline"
        );
        assert_eq!(err.exit_code(), 1);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn malformed_fixture_maps_to_input_exit_code() {
        let parse = serde_json::from_str::<serde_json::Value>("{").expect_err("truncated json");
        let err = AppError::from(parse);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn coverage_failures_have_no_source() {
        let err = AppError::Coverage {
            defective_scopes: 2,
        };
        assert_eq!(
            err.to_string(),
            "2 band set(s) do not partition their score range"
        );
        assert!(std::error::Error::source(&err).is_none());
        assert_eq!(err.exit_code(), 1);
    }
}
