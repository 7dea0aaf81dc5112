//! Startup wiring: configuration to container to registry to augmented proxy.

use std::str::FromStr;
use std::sync::Arc;

use http::Method;
use thiserror::Error;
use tracing::info;
use warden_config::{
    AuthorizationConfig, AuthorizationMode, ConfigError, DomainConfig, PatternPermissionConfig,
    WardenConfig,
};
use warden_core::{ComponentRegistry, Container, DomainDefine, LifecycleError};
use warden_middleware::stages::{
    AuthorizationFilter, IdentityFilter, PatternPermissionFilter, PatternRule, RequestIdFilter,
};
use warden_middleware::{
    BoxedFilter, ChainAugmentor, FilterChainProxy, SecurityFilterChain, FILTER_CHAIN_PROXY_NAME,
};
use warden_telemetry::{LogConfig, TelemetryError};

/// Errors raised while starting Warden.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A component or post-processor failed during initialization.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Logging could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// A pattern permission rule could not be built.
    #[error("invalid pattern permission rule #{index}: {reason}")]
    InvalidRule {
        /// Position of the rule in the configuration.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// Installs the global log subscriber from `config.logging`.
pub fn init_logging(config: &WardenConfig) -> Result<(), BootstrapError> {
    warden_telemetry::init_logging(&LogConfig::from(&config.logging))?;
    Ok(())
}

/// Builds the capability service for the configured domain.
pub fn domain_define(config: &DomainConfig) -> DomainDefine {
    DomainDefine::with_control_types(config.code.clone(), config.control_types.iter().copied())
}

/// Builds the authorization-decision filter for the configured mode.
pub fn authorization_filter(config: &AuthorizationConfig) -> AuthorizationFilter {
    match config.mode {
        AuthorizationMode::AllowAll => AuthorizationFilter::allow_all(),
        AuthorizationMode::DenyAll => AuthorizationFilter::deny_all(),
        AuthorizationMode::Authenticated => AuthorizationFilter::authenticated(),
        AuthorizationMode::Rbac => config
            .rbac
            .iter()
            .fold(AuthorizationFilter::rbac(), |builder, (role, paths)| {
                builder.allow_role(role.clone(), paths.iter().cloned())
            })
            .allow_anonymous_paths(config.anonymous_paths.iter().cloned())
            .build(),
    }
}

/// Builds the regular-pattern permission filter from its rules.
pub fn pattern_permission_filter(
    config: &PatternPermissionConfig,
) -> Result<PatternPermissionFilter, BootstrapError> {
    let rules = config
        .rules
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            let invalid = |reason: String| BootstrapError::InvalidRule { index, reason };
            let built = PatternRule::new(&rule.pattern, rule.permission.clone())
                .map_err(|e| invalid(e.to_string()))?;
            match &rule.method {
                Some(method) => Method::from_str(method)
                    .map(|m| built.with_method(m))
                    .map_err(|e| invalid(e.to_string())),
                None => Ok(built),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PatternPermissionFilter::new(rules))
}

/// The default catch-all chain: request id, identity, authorization.
pub fn standard_chain(config: &AuthorizationConfig) -> SecurityFilterChain {
    let filters: Vec<BoxedFilter> = vec![
        Arc::new(RequestIdFilter::trust_incoming()),
        Arc::new(IdentityFilter::new()),
        Arc::new(authorization_filter(config)),
    ];
    SecurityFilterChain::any_request(filters)
}

/// Registers `proxy`, runs startup augmentation and returns the live proxy.
///
/// The [`DomainDefine`] and [`PatternPermissionFilter`] built from `config`
/// are registered in a [`Container`] and resolved by the
/// [`ChainAugmentor`], which runs as the lowest-precedence post-processor.
///
/// # Errors
///
/// Fails if `config` is invalid, if a rule cannot be built, or if
/// augmentation aborts (for example, the proxy has no chain list while the
/// domain supports regular-pattern control).
pub fn bootstrap(
    config: &WardenConfig,
    proxy: FilterChainProxy,
) -> Result<Arc<FilterChainProxy>, BootstrapError> {
    config.validate()?;

    let mut container = Container::new();
    container.register(Arc::new(domain_define(&config.domain)));
    container.register(Arc::new(pattern_permission_filter(&config.pattern_permission)?));

    let proxy = Arc::new(proxy);
    let mut registry = ComponentRegistry::new();
    registry.register(FILTER_CHAIN_PROXY_NAME, Arc::clone(&proxy))?;
    registry.add_post_processor(ChainAugmentor::from_container(&container).into_post_processor());
    registry.initialize()?;

    info!(
        domain = %config.domain.code,
        chains = ?proxy.describe(),
        "filter chain proxy ready"
    );

    Ok(proxy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_config::PatternRuleConfig;
    use warden_core::{CallerIdentity, ControlTypeSupport, PermissionControlType};
    use warden_middleware::stages::PolicyDecision;

    fn rule(method: Option<&str>, pattern: &str) -> PatternRuleConfig {
        PatternRuleConfig {
            method: method.map(String::from),
            pattern: pattern.to_string(),
            permission: "p".to_string(),
        }
    }

    #[test]
    fn test_domain_define_from_config() {
        let config = DomainConfig {
            code: "techops".to_string(),
            control_types: vec![PermissionControlType::RegularPattern],
        };
        let domain = domain_define(&config);
        assert_eq!(domain.domain_code(), "techops");
        assert!(domain.control_type_support(PermissionControlType::RegularPattern));
        assert!(!domain.control_type_support(PermissionControlType::UriPattern));
    }

    #[test]
    fn test_rbac_authorization_filter() {
        let mut config = AuthorizationConfig {
            mode: AuthorizationMode::Rbac,
            anonymous_paths: vec!["/health".to_string()],
            ..AuthorizationConfig::default()
        };
        config.rbac.insert("support".to_string(), vec!["/api/tickets".to_string()]);

        let filter = authorization_filter(&config);
        let support = CallerIdentity::user("u1").with_roles(["support"]);

        assert_eq!(filter.evaluate(&support, "/api/tickets/7"), PolicyDecision::Allow);
        assert!(matches!(filter.evaluate(&support, "/api/admin"), PolicyDecision::Deny { .. }));
        assert_eq!(
            filter.evaluate(&CallerIdentity::Anonymous, "/health"),
            PolicyDecision::Allow
        );
    }

    #[test]
    fn test_pattern_permission_filter_rules() {
        let config = PatternPermissionConfig {
            rules: vec![rule(Some("DELETE"), r"^/a/\d+$"), rule(None, "^/b")],
        };
        let filter = pattern_permission_filter(&config).unwrap();
        assert_eq!(filter.rules().len(), 2);
        assert_eq!(filter.rules()[0].method(), Some(&Method::DELETE));
        assert_eq!(filter.rules()[1].method(), None);
    }

    #[test]
    fn test_pattern_permission_filter_bad_rule() {
        let config = PatternPermissionConfig {
            rules: vec![rule(None, "^/ok"), rule(None, "(")],
        };
        assert!(matches!(
            pattern_permission_filter(&config),
            Err(BootstrapError::InvalidRule { index: 1, .. })
        ));

        let config = PatternPermissionConfig {
            rules: vec![rule(Some("NOT A METHOD"), "^/ok")],
        };
        assert!(matches!(
            pattern_permission_filter(&config),
            Err(BootstrapError::InvalidRule { index: 0, .. })
        ));
    }

    #[test]
    fn test_standard_chain_shape() {
        let chain = standard_chain(&AuthorizationConfig::default());
        assert!(chain.matcher().is_match_all());
        assert_eq!(chain.filter_names(), ["request_id", "identity", "authorization"]);
    }
}
