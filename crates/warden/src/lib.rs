//! # Warden
//!
//! **Security filter chains with startup augmentation**
//!
//! Warden dispatches each request through the first matching chain of
//! security filters. At startup a [`ChainAugmentor`] splices the
//! regular-pattern permission filter into the catch-all chain, just before
//! the authorization decision, when the domain supports
//! [`PermissionControlType::RegularPattern`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use warden::prelude::*;
//!
//! let config = ConfigLoader::new()
//!     .with_optional_file("warden.toml")?
//!     .with_env_prefix("WARDEN")
//!     .load()?;
//!
//! warden::init_logging(&config)?;
//!
//! let proxy = FilterChainProxy::new(vec![warden::standard_chain(&config.authorization)]);
//! let proxy = warden::bootstrap(&config, proxy)?;
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Request → RequestId → Identity → PatternPermission → Authorization → Handler
//!                                  (inserted at startup)
//! ```

#![doc(html_root_url = "https://docs.rs/warden/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bootstrap;

pub use bootstrap::{
    authorization_filter, bootstrap, domain_define, init_logging, pattern_permission_filter,
    standard_chain, BootstrapError,
};

pub use warden_config as config;
pub use warden_core as core;
pub use warden_middleware as middleware;
pub use warden_telemetry as telemetry;

pub use warden_core::PermissionControlType;
pub use warden_middleware::ChainAugmentor;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use warden::prelude::*;
/// ```
pub mod prelude {
    pub use warden_config::{ConfigLoader, WardenConfig};
    pub use warden_core::{
        CallerIdentity, ComponentRegistry, Container, DomainDefine, LifecycleError,
        PermissionControlType,
    };
    pub use warden_middleware::stages::{
        AuthorizationFilter, IdentityFilter, PatternPermissionFilter, PatternRule, RequestIdFilter,
    };
    pub use warden_middleware::{
        ChainAugmentor, Filter, FilterChainProxy, FilterContext, Request, RequestMatcher,
        Response, SecurityFilterChain,
    };

    pub use crate::BootstrapError;
}
