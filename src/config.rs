//! Service configuration.
//!
//! Loaded from an optional YAML file and `GYM__*` environment variables.

use std::fmt;

use serde::Deserialize;

use crate::domain::{ReportingZone, ValidationError, IST_OFFSET_MINUTES};

/// Default configuration file name, without extension.
pub const DEFAULT_CONFIG_FILE: &str = "gym";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "GYM_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "GYM";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "GYM_LOG";

/// Privileged key to the hosted backend
///
/// Without it the service still tracks attendance, but every command that needs to bypass
/// per-user access rules (signup, admin listings, payments) reports `Unavailable`.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<String>")]
pub enum ServiceCredentials {
    Present(String),
    #[default]
    Absent,
}

impl ServiceCredentials {
    pub fn is_present(&self) -> bool {
        matches!(self, ServiceCredentials::Present(_))
    }
}

impl From<Option<String>> for ServiceCredentials {
    fn from(key: Option<String>) -> Self {
        match key {
            Some(key) if !key.trim().is_empty() => ServiceCredentials::Present(key),
            _ => ServiceCredentials::Absent,
        }
    }
}

// Never print the key itself
impl fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceCredentials::Present(_) => f.write_str("Present(***)"),
            ServiceCredentials::Absent => f.write_str("Absent"),
        }
    }
}

/// Main service configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service_credentials: ServiceCredentials,
    /// Offset of the reporting time zone from UTC, in minutes
    pub reporting_offset_minutes: i32,
    /// Maximum number of records returned by the attendance history
    pub attendance_history_limit: usize,
    /// Maximum number of records returned by the payment history
    pub payment_history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_credentials: ServiceCredentials::Absent,
            reporting_offset_minutes: IST_OFFSET_MINUTES,
            attendance_history_limit: 100,
            payment_history_limit: 100,
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `gym.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ::config::ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn reporting_zone(&self) -> Result<ReportingZone, ValidationError> {
        ReportingZone::from_offset_minutes(self.reporting_offset_minutes)
    }

    /// Create config for testing, with service credentials present.
    pub fn for_test() -> Self {
        Self {
            service_credentials: ServiceCredentials::Present("test-service-key".to_string()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_that!(config.service_credentials.is_present()).is_false();
        assert_that!(config.reporting_zone()).is_ok().is_equal_to(ReportingZone::default());
        assert_that!(config.attendance_history_limit).is_equal_to(100);
    }

    #[test]
    fn test_blank_credentials_are_absent() {
        assert_that!(ServiceCredentials::from(Some("  ".to_string())))
            .is_equal_to(ServiceCredentials::Absent);
        assert_that!(ServiceCredentials::from(None)).is_equal_to(ServiceCredentials::Absent);
    }

    #[test]
    fn test_credentials_are_redacted() {
        let credentials = ServiceCredentials::Present("super-secret".to_string());

        assert_that!(format!("{credentials:?}").contains("super-secret")).is_false();
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("gym-config-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "service_credentials: \"service-key\"\nreporting_offset_minutes: 0\n",
        )
        .unwrap();

        let res = Config::load(path.to_str());
        std::fs::remove_file(&path).unwrap();

        assert_that!(res).is_ok().matches(|config| {
            config.service_credentials.is_present()
                && config.reporting_offset_minutes == 0
                && config.payment_history_limit == 100
        });
    }

    #[test]
    fn test_invalid_offset() {
        let config = Config {
            reporting_offset_minutes: 24 * 60,
            ..Config::default()
        };

        assert_that!(config.reporting_zone()).is_err();
    }
}
