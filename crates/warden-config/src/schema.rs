//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use warden_core::PermissionControlType;

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level or `EnvFilter` directive (e.g., `info`, `warden=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Domain section: which permission control types this domain supports.
///
/// ```toml
/// [domain]
/// code = "techops"
/// control_types = ["uri_pattern", "regular_pattern"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DomainConfig {
    /// Domain code.
    #[serde(default = "default_domain_code")]
    pub code: String,

    /// Enabled permission control types.
    #[serde(default)]
    pub control_types: Vec<PermissionControlType>,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            code: default_domain_code(),
            control_types: Vec::new(),
        }
    }
}

impl DomainConfig {
    /// Returns `true` if regular-pattern permission control is enabled.
    pub fn regular_pattern_enabled(&self) -> bool {
        self.control_types
            .contains(&PermissionControlType::RegularPattern)
    }
}

fn default_domain_code() -> String {
    "default".to_string()
}

/// Authorization mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationMode {
    /// Allow all requests (development only).
    AllowAll,
    /// Deny all requests.
    DenyAll,
    /// Allow any authenticated caller.
    #[default]
    Authenticated,
    /// Role-based access control.
    Rbac,
}

/// Authorization section.
///
/// ```toml
/// [authorization]
/// mode = "rbac"
/// anonymous_paths = ["/health"]
///
/// [authorization.rbac]
/// admin = ["*"]
/// user = ["/api/users"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct AuthorizationConfig {
    /// Authorization mode.
    #[serde(default)]
    pub mode: AuthorizationMode,

    /// Role to allowed path prefixes (`rbac` mode).
    #[serde(default)]
    pub rbac: IndexMap<String, Vec<String>>,

    /// Path prefixes open to anonymous callers (`rbac` mode).
    #[serde(default)]
    pub anonymous_paths: Vec<String>,
}

/// One regular-pattern permission rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PatternRuleConfig {
    /// HTTP method restriction; any method when absent.
    #[serde(default)]
    pub method: Option<String>,

    /// Regular expression matched against the request path.
    pub pattern: String,

    /// Permission code the caller must hold.
    pub permission: String,
}

/// Regular-pattern permission section.
///
/// ```toml
/// [[pattern_permission.rules]]
/// method = "GET"
/// pattern = '^/api/users/\d+$'
/// permission = "user:read"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PatternPermissionConfig {
    /// Rules in evaluation order.
    #[serde(default)]
    pub rules: Vec<PatternRuleConfig>,
}
