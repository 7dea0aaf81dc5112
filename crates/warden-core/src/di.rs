//! Typed service container.
//!
//! Startup code registers shared services once; components resolve them by
//! type when they are wired together.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use warden_core::{Container, DomainDefine};
//!
//! let mut container = Container::new();
//! container.register(Arc::new(DomainDefine::new("techops")));
//!
//! let domain: Arc<DomainDefine> = container.resolve().unwrap();
//! assert_eq!(domain.domain_code(), "techops");
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{LifecycleError, LifecycleResult};

/// A container of `Arc`-shared services keyed by their type.
///
/// Registering a second service of the same type replaces the first.
#[derive(Default)]
pub struct Container {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service, returning the one it replaced.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: Arc<T>) -> Option<Arc<T>> {
        self.services
            .insert(TypeId::of::<T>(), service)
            .and_then(|old| old.downcast::<T>().ok())
    }

    /// Resolves a service by type.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|s| Arc::clone(s).downcast::<T>().ok())
    }

    /// Resolves a service on behalf of `component`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::MissingDependency`] if no service of type
    /// `T` was registered.
    pub fn resolve_required<T: Send + Sync + 'static>(
        &self,
        component: &str,
    ) -> LifecycleResult<Arc<T>> {
        self.resolve()
            .ok_or_else(|| LifecycleError::missing_dependency(component, std::any::type_name::<T>()))
    }

    /// Returns `true` if a service of type `T` is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.services.len())
            .finish()
    }
}
