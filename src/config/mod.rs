mod loader;
mod rules;

pub use loader::RuleConfigLoader;
pub use rules::{ConfigError, RuleConfig, RuleSet, TermRule, VocabularyDescriptor};

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Upper bound for `FAIR_VOCABULARY_RETRIES`.
pub const MAX_VOCABULARY_RETRIES: u32 = 10;

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

/// Top-level configuration for the evaluator process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub rules: RulesConfig,
    pub vocabulary: VocabularyConfig,
    pub evaluation: EvaluationSettings,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, AppConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let config_dir = env::var("FAIR_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let remote_refresh = parse_bool("FAIR_VOCABULARY_REMOTE", false)?;
        let timeout_secs = parse_u64("FAIR_VOCABULARY_TIMEOUT_SECS", 10)?;
        let max_retries = parse_u64("FAIR_VOCABULARY_RETRIES", 2)?;
        let max_retries = u32::try_from(max_retries)
            .ok()
            .filter(|retries| *retries <= MAX_VOCABULARY_RETRIES)
            .ok_or(AppConfigError::OutOfRange {
                variable: "FAIR_VOCABULARY_RETRIES",
                max: u64::from(MAX_VOCABULARY_RETRIES),
            })?;
        let evaluation_timeout = parse_u64("FAIR_EVALUATION_TIMEOUT_SECS", 60)?;

        Ok(Self {
            environment,
            rules: RulesConfig {
                config_dir: PathBuf::from(config_dir),
            },
            vocabulary: VocabularyConfig {
                remote_refresh,
                timeout: Duration::from_secs(timeout_secs),
                max_retries,
                initial_backoff: Duration::from_millis(250),
            },
            evaluation: EvaluationSettings {
                timeout: Duration::from_secs(evaluation_timeout),
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn parse_u64(variable: &'static str, default: u64) -> Result<u64, AppConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| AppConfigError::InvalidNumber { variable }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(variable: &'static str, default: bool) -> Result<bool, AppConfigError> {
    match env::var(variable) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(AppConfigError::InvalidFlag { variable }),
        },
        Err(_) => Ok(default),
    }
}

/// Location of the global and per-profile rule documents.
#[derive(Debug, Clone)]
pub struct RulesConfig {
    pub config_dir: PathBuf,
}

/// Remote reference-list refresh controls.
#[derive(Debug, Clone)]
pub struct VocabularyConfig {
    pub remote_refresh: bool,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            remote_refresh: false,
            timeout: Duration::from_secs(10),
            max_retries: 2,
            initial_backoff: Duration::from_millis(250),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EvaluationSettings {
    pub timeout: Duration,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum AppConfigError {
    InvalidNumber { variable: &'static str },
    InvalidFlag { variable: &'static str },
    OutOfRange { variable: &'static str, max: u64 },
}

impl fmt::Display for AppConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a non-negative integer")
            }
            AppConfigError::InvalidFlag { variable } => {
                write!(f, "{variable} must be a boolean (true/false)")
            }
            AppConfigError::OutOfRange { variable, max } => {
                write!(f, "{variable} must not exceed {max}")
            }
        }
    }
}

impl std::error::Error for AppConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for variable in [
            "APP_ENV",
            "APP_LOG_LEVEL",
            "FAIR_CONFIG_DIR",
            "FAIR_VOCABULARY_REMOTE",
            "FAIR_VOCABULARY_TIMEOUT_SECS",
            "FAIR_VOCABULARY_RETRIES",
            "FAIR_EVALUATION_TIMEOUT_SECS",
        ] {
            env::remove_var(variable);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.rules.config_dir, PathBuf::from("config"));
        assert!(!config.vocabulary.remote_refresh);
        assert_eq!(config.vocabulary.max_retries, 2);
        assert_eq!(config.evaluation.timeout, Duration::from_secs(60));
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn rejects_malformed_flags_and_numbers() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("FAIR_VOCABULARY_REMOTE", "maybe");
        match AppConfig::load() {
            Err(AppConfigError::InvalidFlag { variable }) => {
                assert_eq!(variable, "FAIR_VOCABULARY_REMOTE")
            }
            other => panic!("expected invalid flag, got {other:?}"),
        }

        reset_env();
        env::set_var("FAIR_EVALUATION_TIMEOUT_SECS", "-3");
        assert!(matches!(
            AppConfig::load(),
            Err(AppConfigError::InvalidNumber {
                variable: "FAIR_EVALUATION_TIMEOUT_SECS"
            })
        ));
        reset_env();
    }

    #[test]
    fn caps_vocabulary_retries() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("FAIR_VOCABULARY_RETRIES", "10");
        assert_eq!(
            AppConfig::load().expect("upper bound accepted").vocabulary.max_retries,
            MAX_VOCABULARY_RETRIES
        );

        for raw in ["11", "4294967296"] {
            env::set_var("FAIR_VOCABULARY_RETRIES", raw);
            match AppConfig::load() {
                Err(AppConfigError::OutOfRange { variable, max }) => {
                    assert_eq!(variable, "FAIR_VOCABULARY_RETRIES");
                    assert_eq!(max, 10);
                }
                other => panic!("expected out of range for {raw}, got {other:?}"),
            }
        }
        reset_env();
    }
}
