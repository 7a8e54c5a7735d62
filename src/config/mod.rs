use crate::diagnostic::domain::CategoryId;
use crate::diagnostic::evolution::EvolutionConfig;
use crate::diagnostic::legacy::{LegacyCategory, LegacySchema};
use std::env;
use std::fmt;

const DEFAULT_LEGACY_CATEGORIES: &str =
    "1:estrategia,2:processos,3:pessoas,4:tecnologia,5:dados,6:cliente";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub diagnostic: DiagnosticConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = EvolutionConfig::default();
        let evolution = EvolutionConfig {
            trend_months: positive_var("DIAGNOSTIC_TREND_MONTHS", defaults.trend_months)?,
            top_categories: positive_var("DIAGNOSTIC_TOP_CATEGORIES", defaults.top_categories)?,
        };

        let legacy_categories = env::var("DIAGNOSTIC_LEGACY_CATEGORIES")
            .unwrap_or_else(|_| DEFAULT_LEGACY_CATEGORIES.to_string());
        let legacy = LegacySchema::new(parse_legacy_categories(&legacy_categories)?);

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            diagnostic: DiagnosticConfig { evolution, legacy },
        })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Analytics windows and the legacy export layout.
#[derive(Debug, Clone)]
pub struct DiagnosticConfig {
    pub evolution: EvolutionConfig,
    pub legacy: LegacySchema,
}

fn positive_var(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidWindow { name, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

/// Parses `id:prefix` pairs separated by commas, e.g. `1:estrategia,2:processos`.
fn parse_legacy_categories(raw: &str) -> Result<Vec<LegacyCategory>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let invalid = || ConfigError::InvalidLegacyCategory(entry.to_string());
            let (id, prefix) = entry.split_once(':').ok_or_else(invalid)?;
            let id = id.trim().parse::<u32>().map_err(|_| invalid())?;
            let prefix = prefix.trim();
            if prefix.is_empty() {
                return Err(invalid());
            }
            Ok(LegacyCategory::new(CategoryId(id), prefix))
        })
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidWindow { name: &'static str, value: String },
    InvalidLegacyCategory(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidWindow { name, value } => {
                write!(f, "{name} must be a positive integer (got '{value}')")
            }
            ConfigError::InvalidLegacyCategory(entry) => write!(
                f,
                "DIAGNOSTIC_LEGACY_CATEGORIES entry '{entry}' must look like <id>:<prefix>"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
