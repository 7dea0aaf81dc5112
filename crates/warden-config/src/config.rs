//! Main configuration types.
//!
//! This module provides the top-level [`WardenConfig`] struct and its validation.

use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use warden_core::PermissionControlType;

use crate::{
    AuthorizationConfig, AuthorizationMode, ConfigError, DomainConfig, LogFormat, LoggingConfig,
    PatternPermissionConfig,
};

/// Complete Warden configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use warden_config::WardenConfig;
///
/// let config = WardenConfig::default();
/// assert_eq!(config.domain.code, "default");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct WardenConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Domain capability configuration.
    #[serde(default)]
    pub domain: DomainConfig,

    /// Authorization decision configuration.
    #[serde(default)]
    pub authorization: AuthorizationConfig,

    /// Regular-pattern permission rules.
    #[serde(default)]
    pub pattern_permission: PatternPermissionConfig,
}

impl WardenConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - The domain code is empty
    /// - The log level is not a valid filter directive
    /// - A pattern rule has an invalid regular expression or HTTP method
    /// - An RBAC role has no paths
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.code.trim().is_empty() {
            return Err(ConfigError::invalid_value("domain.code", "must not be empty"));
        }

        validate_log_level(&self.logging.level)?;

        for (i, rule) in self.pattern_permission.rules.iter().enumerate() {
            if let Err(e) = Regex::new(&rule.pattern) {
                return Err(ConfigError::invalid_value(
                    format!("pattern_permission.rules[{i}].pattern"),
                    e.to_string(),
                ));
            }
            if rule.permission.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("pattern_permission.rules[{i}].permission"),
                    "must not be empty",
                ));
            }
            if let Some(method) = &rule.method {
                if http::Method::from_str(method).is_err() {
                    return Err(ConfigError::invalid_value(
                        format!("pattern_permission.rules[{i}].method"),
                        format!("invalid HTTP method: {method}"),
                    ));
                }
            }
        }

        if self.authorization.mode == AuthorizationMode::Rbac {
            if let Some((role, _)) = self.authorization.rbac.iter().find(|(_, p)| p.is_empty()) {
                return Err(ConfigError::invalid_value(
                    format!("authorization.rbac.{role}"),
                    "role grants no paths",
                ));
            }
        }

        Ok(())
    }

    /// Development preset: pretty debug logs, allow-all authorization.
    ///
    /// ```
    /// use warden_config::WardenConfig;
    ///
    /// let config = WardenConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;
        config.authorization.mode = AuthorizationMode::AllowAll;
        config
    }

    /// Production preset: JSON info logs, authenticated callers only.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.authorization.mode = AuthorizationMode::Authenticated;
        config
    }
}

const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Accepts a bare level or comma separated `target=level` directives.
fn validate_log_level(level: &str) -> Result<(), ConfigError> {
    let valid = !level.trim().is_empty()
        && level.split(',').all(|directive| {
            let level = directive.rsplit('=').next().unwrap_or_default().trim();
            LEVELS.contains(&level.to_ascii_lowercase().as_str())
        });

    if valid {
        Ok(())
    } else {
        Err(ConfigError::invalid_value(
            "logging.level",
            format!("invalid level or directive: {level}"),
        ))
    }
}

/// Parses a comma separated list of control types, as used by env overrides.
pub(crate) fn parse_control_types(value: &str) -> Result<Vec<PermissionControlType>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PermissionControlType::from_str)
        .collect()
}
