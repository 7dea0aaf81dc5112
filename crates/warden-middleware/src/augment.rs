//! Startup augmentation of the filter chain proxy.
//!
//! A [`PipelineAugmenter`] edits the chains of an already-built
//! [`FilterChainProxy`]. [`PipelineAugmentation`] adapts an augmenter to the
//! component registry's [`ComponentPostProcessor`] hook: it ignores every
//! component except the one registered under [`FILTER_CHAIN_PROXY_NAME`],
//! consults the augmenter's feature switch on every call, and hands the
//! proxy over for in-place mutation.
//!
//! [`ChainAugmentor`] is the stock augmenter. It splices a custom filter into
//! the catch-all chain:
//!
//! 1. The first chain whose matcher is match-all is selected.
//! 2. If it contains an [`AuthorizationFilter`], the custom filter is inserted
//!    immediately before it.
//! 3. Otherwise the custom filter is inserted one position before the end of
//!    the chain, at index `0` for an empty chain.
//! 4. If no chain is match-all, a new `AnyRequest => [custom]` chain is
//!    appended, through the proxy's internal chain list when the proxy is
//!    sealed.
//!
//! Augmentation is not idempotent: running it twice inserts the filter twice.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use warden_core::{ComponentRegistry, DomainDefine, PermissionControlType};
//! use warden_middleware::stages::{AuthorizationFilter, PatternPermissionFilter};
//! use warden_middleware::{ChainAugmentor, FilterChainProxy, SecurityFilterChain, FILTER_CHAIN_PROXY_NAME};
//!
//! let proxy = Arc::new(FilterChainProxy::new(vec![SecurityFilterChain::any_request(vec![
//!     Arc::new(AuthorizationFilter::allow_all()),
//! ])]));
//!
//! let domain = Arc::new(DomainDefine::with_control_types("iam", [PermissionControlType::RegularPattern]));
//! let augmentor = ChainAugmentor::new()
//!     .with_custom_filter(Arc::new(PatternPermissionFilter::default()))
//!     .with_capabilities(domain);
//!
//! let mut registry = ComponentRegistry::new();
//! registry.register(FILTER_CHAIN_PROXY_NAME, Arc::clone(&proxy))?;
//! registry.add_post_processor(augmentor.into_post_processor());
//! registry.initialize()?;
//!
//! assert_eq!(proxy.describe(), ["any request => [pattern_permission, authorization]"]);
//! # Ok::<(), warden_core::LifecycleError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};
use warden_core::lifecycle::Component;
use warden_core::{
    ComponentPostProcessor, Container, ControlTypeSupport, DomainDefine, LifecycleError,
    LifecycleResult, PermissionControlType, LOWEST_PRECEDENCE,
};

use crate::chain::SecurityFilterChain;
use crate::filter::BoxedFilter;
use crate::proxy::{FilterChainProxy, FILTER_CHAIN_PROXY_NAME};
use crate::stages::{AuthorizationFilter, PatternPermissionFilter};

/// Name of the [`ChainAugmentor`] in logs and errors.
pub const CHAIN_AUGMENTOR_NAME: &str = "chain_augmentor";

/// How a new chain was added to the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendPath {
    /// Through [`FilterChainProxy::append_chain`].
    Direct,
    /// Through [`FilterChainProxy::internal_chain_list`] on a sealed proxy.
    InternalList,
}

/// What an augmentation did to the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Augmentation {
    /// The filter was inserted immediately before the authorization filter.
    InsertedBeforeAuthorization {
        /// Index of the match-all chain.
        chain_index: usize,
        /// Index the filter now occupies.
        position: usize,
    },
    /// The match-all chain has no authorization filter; the filter was
    /// inserted one position before the end.
    InsertedAtFallback {
        /// Index of the match-all chain.
        chain_index: usize,
        /// Index the filter now occupies.
        position: usize,
    },
    /// No chain was match-all; a new one was appended.
    AppendedChain {
        /// Index of the new chain.
        chain_index: usize,
        /// How the chain was added.
        via: AppendPath,
    },
}

/// Edits a [`FilterChainProxy`] during startup.
pub trait PipelineAugmenter: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Scheduling order among post-processors.
    fn order(&self) -> i32 {
        LOWEST_PRECEDENCE
    }

    /// Feature switch, consulted on every lifecycle event.
    fn is_enabled(&self) -> bool;

    /// Checks that all dependencies were supplied.
    fn validate(&self) -> LifecycleResult<()> {
        Ok(())
    }

    /// Mutates the proxy in place, ignoring the feature switch.
    fn augment(&self, proxy: &FilterChainProxy) -> LifecycleResult<Augmentation>;
}

/// Runs a [`PipelineAugmenter`] as a [`ComponentPostProcessor`].
#[derive(Debug)]
pub struct PipelineAugmentation<A> {
    augmenter: A,
}

impl<A: PipelineAugmenter> PipelineAugmentation<A> {
    /// Wraps `augmenter`.
    pub fn new(augmenter: A) -> Self {
        Self { augmenter }
    }

    /// Returns the wrapped augmenter.
    pub fn augmenter(&self) -> &A {
        &self.augmenter
    }
}

impl<A: PipelineAugmenter> ComponentPostProcessor for PipelineAugmentation<A> {
    fn name(&self) -> &'static str {
        self.augmenter.name()
    }

    fn order(&self) -> i32 {
        self.augmenter.order()
    }

    fn validate(&self) -> LifecycleResult<()> {
        self.augmenter.validate()
    }

    fn after_init(&self, component: Component, name: &str) -> LifecycleResult<Component> {
        if !self.augmenter.is_enabled() {
            if name == FILTER_CHAIN_PROXY_NAME {
                debug!(augmenter = self.augmenter.name(), "augmentation disabled, proxy left unchanged");
            }
            return Ok(component);
        }
        if name != FILTER_CHAIN_PROXY_NAME {
            return Ok(component);
        }

        let Some(proxy) = component.downcast_ref::<FilterChainProxy>() else {
            warn!(
                augmenter = self.augmenter.name(),
                component = name,
                "component registered under the proxy name is not a FilterChainProxy"
            );
            return Ok(component);
        };

        let outcome = self.augmenter.augment(proxy)?;
        debug!(augmenter = self.augmenter.name(), ?outcome, chains = ?proxy.describe(), "proxy augmented");
        Ok(component)
    }
}

/// Inserts a custom filter into the catch-all chain when the domain enables
/// regular-pattern permission control.
#[derive(Default)]
pub struct ChainAugmentor {
    custom_filter: Option<BoxedFilter>,
    capabilities: Option<Arc<dyn ControlTypeSupport>>,
}

impl ChainAugmentor {
    /// Creates an augmentor with no dependencies.
    ///
    /// Supply them with [`with_custom_filter`](Self::with_custom_filter) and
    /// [`with_capabilities`](Self::with_capabilities).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the [`PatternPermissionFilter`] and [`DomainDefine`] from
    /// `container`. Missing services are left unset and reported by
    /// [`validate`](PipelineAugmenter::validate).
    #[must_use]
    pub fn from_container(container: &Container) -> Self {
        Self {
            custom_filter: container
                .resolve::<PatternPermissionFilter>()
                .map(|f| f as BoxedFilter),
            capabilities: container
                .resolve::<DomainDefine>()
                .map(|d| d as Arc<dyn ControlTypeSupport>),
        }
    }

    /// Sets the filter to insert.
    #[must_use]
    pub fn with_custom_filter(mut self, filter: BoxedFilter) -> Self {
        self.custom_filter = Some(filter);
        self
    }

    /// Sets the capability service providing the feature switch.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Arc<dyn ControlTypeSupport>) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    /// Returns `true` if the domain currently supports regular-pattern
    /// permission control. Always `false` without a capability service.
    pub fn is_enabled(&self) -> bool {
        self.capabilities
            .as_ref()
            .is_some_and(|c| c.control_type_support(PermissionControlType::RegularPattern))
    }

    /// Wraps the augmentor for registration with a component registry.
    pub fn into_post_processor(self) -> Arc<dyn ComponentPostProcessor> {
        Arc::new(PipelineAugmentation::new(self))
    }

    fn require_custom_filter(&self) -> LifecycleResult<BoxedFilter> {
        self.custom_filter
            .clone()
            .ok_or_else(|| LifecycleError::missing_dependency(CHAIN_AUGMENTOR_NAME, "custom filter"))
    }

    fn append_chain(
        proxy: &FilterChainProxy,
        chain: SecurityFilterChain,
        chain_index: usize,
    ) -> LifecycleResult<Augmentation> {
        let filter = chain.filter_names().join(", ");

        if proxy.supports_append() {
            proxy.append_chain(chain).map_err(|_| {
                LifecycleError::incompatible_host(CHAIN_AUGMENTOR_NAME, "proxy rejected a new chain")
            })?;
            info!(chain_index, filter = %filter, "no match-all chain found, appended a new one");
            return Ok(Augmentation::AppendedChain {
                chain_index,
                via: AppendPath::Direct,
            });
        }

        warn!(
            chain_index,
            filter = %filter,
            "no match-all chain found and proxy does not support appending, using its internal chain list"
        );
        let mut chains = proxy.internal_chain_list().ok_or_else(|| {
            LifecycleError::incompatible_host(CHAIN_AUGMENTOR_NAME, "filter chain list is unavailable")
        })?;
        chains.push(chain);
        Ok(Augmentation::AppendedChain {
            chain_index,
            via: AppendPath::InternalList,
        })
    }
}

impl PipelineAugmenter for ChainAugmentor {
    fn name(&self) -> &'static str {
        CHAIN_AUGMENTOR_NAME
    }

    fn is_enabled(&self) -> bool {
        ChainAugmentor::is_enabled(self)
    }

    fn validate(&self) -> LifecycleResult<()> {
        self.require_custom_filter()?;
        if self.capabilities.is_none() {
            return Err(LifecycleError::missing_dependency(
                CHAIN_AUGMENTOR_NAME,
                "capability service",
            ));
        }
        Ok(())
    }

    fn augment(&self, proxy: &FilterChainProxy) -> LifecycleResult<Augmentation> {
        let custom = self.require_custom_filter()?;
        let filter = custom.name();

        let Some(mut chains) = proxy.filter_chains() else {
            return Err(LifecycleError::incompatible_host(
                CHAIN_AUGMENTOR_NAME,
                "filter chain list is unavailable",
            ));
        };

        if let Some((chain_index, chain)) = chains
            .iter_mut()
            .enumerate()
            .find(|(_, c)| c.matcher().is_match_all())
        {
            let filters = chain.filters_mut();
            let anchor = filters.iter().position(|f| f.is::<AuthorizationFilter>());

            return Ok(match anchor {
                Some(position) => {
                    filters.insert(position, custom);
                    info!(chain_index, position, filter, "filter inserted before authorization filter");
                    Augmentation::InsertedBeforeAuthorization {
                        chain_index,
                        position,
                    }
                }
                None => {
                    let position = filters.len().saturating_sub(1);
                    filters.insert(position, custom);
                    warn!(
                        chain_index,
                        position,
                        filter,
                        "match-all chain has no authorization filter, inserted one before the end"
                    );
                    Augmentation::InsertedAtFallback {
                        chain_index,
                        position,
                    }
                }
            });
        }

        let chain_index = chains.len();
        drop(chains);
        Self::append_chain(proxy, SecurityFilterChain::any_request(vec![custom]), chain_index)
    }
}

impl fmt::Debug for ChainAugmentor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainAugmentor")
            .field("custom_filter", &self.custom_filter.as_ref().map(|c| c.name()))
            .field("capabilities", &self.capabilities.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{IdentityFilter, RequestIdFilter};
    use warden_core::ComponentRegistry;

    fn domain(enabled: bool) -> Arc<DomainDefine> {
        let domain = Arc::new(DomainDefine::new("iam"));
        if enabled {
            domain.set_control_types([PermissionControlType::RegularPattern]);
        }
        domain
    }

    fn augmentor(enabled: bool) -> ChainAugmentor {
        ChainAugmentor::new()
            .with_custom_filter(Arc::new(PatternPermissionFilter::default()))
            .with_capabilities(domain(enabled))
    }

    fn standard() -> Vec<BoxedFilter> {
        vec![
            Arc::new(RequestIdFilter::new()),
            Arc::new(IdentityFilter::new()),
            Arc::new(AuthorizationFilter::allow_all()),
        ]
    }

    #[test]
    fn test_is_enabled_follows_capability() {
        let domain = domain(false);
        let augmentor = ChainAugmentor::new()
            .with_custom_filter(Arc::new(PatternPermissionFilter::default()))
            .with_capabilities(Arc::clone(&domain) as Arc<dyn ControlTypeSupport>);

        assert!(!augmentor.is_enabled());
        domain.set_control_types([PermissionControlType::UriPattern, PermissionControlType::RegularPattern]);
        assert!(augmentor.is_enabled());
        domain.set_control_types([PermissionControlType::UriPattern]);
        assert!(!augmentor.is_enabled());
    }

    #[test]
    fn test_disabled_without_capabilities() {
        assert!(!ChainAugmentor::new().is_enabled());
    }

    #[test]
    fn test_validate_requires_both_dependencies() {
        assert!(augmentor(true).validate().is_ok());

        let no_filter = ChainAugmentor::new().with_capabilities(domain(true));
        assert!(matches!(
            no_filter.validate(),
            Err(LifecycleError::MissingDependency { ref dependency, .. }) if dependency == "custom filter"
        ));

        let no_caps =
            ChainAugmentor::new().with_custom_filter(Arc::new(PatternPermissionFilter::default()));
        assert!(matches!(
            no_caps.validate(),
            Err(LifecycleError::MissingDependency { ref dependency, .. }) if dependency == "capability service"
        ));
    }

    #[test]
    fn test_from_container() {
        let mut container = Container::new();
        assert!(ChainAugmentor::from_container(&container).validate().is_err());

        container.register(Arc::new(PatternPermissionFilter::default()));
        container.register(domain(true));
        let augmentor = ChainAugmentor::from_container(&container);

        assert!(augmentor.validate().is_ok());
        assert!(augmentor.is_enabled());
    }

    #[test]
    fn test_runs_at_lowest_precedence() {
        let processor = augmentor(true).into_post_processor();
        assert_eq!(processor.order(), LOWEST_PRECEDENCE);
        assert_eq!(processor.name(), CHAIN_AUGMENTOR_NAME);
    }

    #[test]
    fn test_inserts_before_authorization() {
        let proxy = FilterChainProxy::new(vec![SecurityFilterChain::any_request(standard())]);

        let outcome = augmentor(true).augment(&proxy).unwrap();

        assert_eq!(
            outcome,
            Augmentation::InsertedBeforeAuthorization {
                chain_index: 0,
                position: 2
            }
        );
        assert_eq!(
            proxy.describe(),
            ["any request => [request_id, identity, pattern_permission, authorization]"]
        );
    }

    #[test]
    fn test_fallback_position_without_authorization() {
        let proxy = FilterChainProxy::new(vec![SecurityFilterChain::any_request(vec![
            Arc::new(RequestIdFilter::new()),
            Arc::new(IdentityFilter::new()),
        ])]);

        let outcome = augmentor(true).augment(&proxy).unwrap();

        assert_eq!(
            outcome,
            Augmentation::InsertedAtFallback {
                chain_index: 0,
                position: 1
            }
        );
        assert_eq!(
            proxy.describe(),
            ["any request => [request_id, pattern_permission, identity]"]
        );
    }

    #[test]
    fn test_fallback_on_empty_chain() {
        let proxy = FilterChainProxy::new(vec![SecurityFilterChain::any_request(Vec::new())]);

        let outcome = augmentor(true).augment(&proxy).unwrap();

        assert_eq!(
            outcome,
            Augmentation::InsertedAtFallback {
                chain_index: 0,
                position: 0
            }
        );
        assert_eq!(proxy.describe(), ["any request => [pattern_permission]"]);
    }

    #[test]
    fn test_missing_chain_list_is_fatal() {
        let proxy = FilterChainProxy::without_chains();
        let err = augmentor(true).augment(&proxy).unwrap_err();
        assert!(matches!(err, LifecycleError::IncompatibleHost { .. }));
    }

    #[test]
    fn test_non_proxy_component_passes_through() {
        let processor = PipelineAugmentation::new(augmentor(true));
        let component: Component = Arc::new(String::from("not a proxy"));

        let same = processor.after_init(Arc::clone(&component), "other").unwrap();
        assert!(Arc::ptr_eq(&same, &component));

        let same = processor
            .after_init(Arc::clone(&component), FILTER_CHAIN_PROXY_NAME)
            .unwrap();
        assert!(Arc::ptr_eq(&same, &component));
    }

    #[test]
    fn test_proxy_returned_as_same_instance() {
        let proxy = Arc::new(FilterChainProxy::new(vec![SecurityFilterChain::any_request(standard())]));
        let mut registry = ComponentRegistry::new();
        registry.register(FILTER_CHAIN_PROXY_NAME, Arc::clone(&proxy)).unwrap();
        registry.add_post_processor(augmentor(true).into_post_processor());
        registry.initialize().unwrap();

        let registered: Arc<FilterChainProxy> = registry.get(FILTER_CHAIN_PROXY_NAME).unwrap();
        assert!(Arc::ptr_eq(&registered, &proxy));
        assert_eq!(proxy.chain_count(), 1);
        assert!(proxy.filter_chains().unwrap()[0].filters()[2].is::<PatternPermissionFilter>());
    }

    #[test]
    fn test_debug_names_custom_filter() {
        let debug = format!("{:?}", augmentor(true));
        assert!(debug.contains("pattern_permission"));
        assert!(debug.contains("capabilities: true"));
    }
}
