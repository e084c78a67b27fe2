use std::env;
use std::fmt;

use crate::workflows::booking::matching::{
    MatchConfig, DEFAULT_MATCH_THRESHOLD, DEFAULT_UNMET_NEED_PENALTY,
};

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
    pub matching: MatchConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let match_threshold = score_var("SHELTER_MATCH_THRESHOLD", DEFAULT_MATCH_THRESHOLD)?;
        let unmet_need_penalty = score_var("SHELTER_NEED_PENALTY", DEFAULT_UNMET_NEED_PENALTY)?;

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            matching: MatchConfig {
                match_threshold,
                unmet_need_penalty,
            },
        })
    }
}

/// Reads a 0-100 score dial from the environment, falling back to its default.
fn score_var(name: &'static str, default: i16) -> Result<i16, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .trim()
            .parse::<i16>()
            .ok()
            .filter(|value| (0..=100).contains(value))
            .ok_or(ConfigError::InvalidScore { name, value: raw }),
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidScore { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidScore { name, value } => {
                write!(f, "{name} must be an integer between 0 and 100 (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

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
        env::remove_var("APP_ENV");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("SHELTER_MATCH_THRESHOLD");
        env::remove_var("SHELTER_NEED_PENALTY");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.matching.match_threshold, DEFAULT_MATCH_THRESHOLD);
        assert_eq!(config.matching.unmet_need_penalty, DEFAULT_UNMET_NEED_PENALTY);
    }

    #[test]
    fn threshold_can_be_tuned_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SHELTER_MATCH_THRESHOLD", "75");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.matching.match_threshold, 75);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SHELTER_MATCH_THRESHOLD", "140");
        let err = AppConfig::load().expect_err("threshold above 100 must fail");
        assert!(err.to_string().contains("SHELTER_MATCH_THRESHOLD"));
    }
}
