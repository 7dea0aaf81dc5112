//! Typed configuration for Warden.
//!
//! Configuration is layered: defaults, then an optional TOML or JSON file,
//! then `PREFIX__SECTION__KEY` environment variables. Unknown fields are
//! rejected.
//!
//! # Example
//!
//! ```no_run
//! use warden_config::ConfigLoader;
//!
//! # fn main() -> Result<(), warden_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("warden.toml")?
//!     .with_env_prefix("WARDEN")
//!     .load()?;
//!
//! if config.domain.regular_pattern_enabled() {
//!     println!("pattern permissions active for {}", config.domain.code);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [domain]
//! code = "techops"
//! control_types = ["uri_pattern", "regular_pattern"]
//!
//! [authorization]
//! mode = "rbac"
//! anonymous_paths = ["/health"]
//!
//! [authorization.rbac]
//! admin = ["*"]
//!
//! [[pattern_permission.rules]]
//! method = "DELETE"
//! pattern = '^/api/users/\d+$'
//! permission = "user:delete"
//! ```
//!
//! # Environment overrides
//!
//! | Variable | Field |
//! |---|---|
//! | `PREFIX__DOMAIN__CODE` | `domain.code` |
//! | `PREFIX__DOMAIN__CONTROL_TYPES` | `domain.control_types` (comma separated) |
//! | `PREFIX__LOGGING__LEVEL` | `logging.level` |
//! | `PREFIX__LOGGING__FORMAT` | `logging.format` |
//! | `PREFIX__LOGGING__INCLUDE_LOCATION` | `logging.include_location` |
//! | `PREFIX__AUTHORIZATION__MODE` | `authorization.mode` |

#![doc(html_root_url = "https://docs.rs/warden-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::WardenConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    AuthorizationConfig, AuthorizationMode, DomainConfig, LogFormat, LoggingConfig,
    PatternPermissionConfig, PatternRuleConfig,
};
