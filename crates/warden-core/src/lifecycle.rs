//! Named components and post-processor lifecycle hooks.
//!
//! The [`ComponentRegistry`] owns every named component of the process.
//! During [`ComponentRegistry::initialize`] each component is handed, in
//! registration order, to every registered [`ComponentPostProcessor`]:
//! first through [`before_init`](ComponentPostProcessor::before_init), then
//! through [`after_init`](ComponentPostProcessor::after_init). A processor
//! may return the component unchanged, mutate it in place, or substitute
//! another value.
//!
//! # Execution Order
//!
//! - Processors run in ascending [`order`](ComponentPostProcessor::order);
//!   ties keep registration order.
//! - Every processor is validated before any component is processed.
//! - Initialization happens once; the first error aborts it.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use warden_core::lifecycle::{Component, ComponentPostProcessor, ComponentRegistry};
//! use warden_core::LifecycleResult;
//!
//! struct Audit;
//!
//! impl ComponentPostProcessor for Audit {
//!     fn name(&self) -> &'static str {
//!         "audit"
//!     }
//!
//!     fn after_init(&self, component: Component, name: &str) -> LifecycleResult<Component> {
//!         tracing::debug!(component = name, "initialized");
//!         Ok(component)
//!     }
//! }
//!
//! let mut registry = ComponentRegistry::new();
//! registry.register("greeting", Arc::new(String::from("hello"))).unwrap();
//! registry.add_post_processor(Arc::new(Audit));
//! registry.initialize().unwrap();
//!
//! let greeting: Arc<String> = registry.get("greeting").unwrap();
//! assert_eq!(greeting.as_str(), "hello");
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::{LifecycleError, LifecycleResult};

/// A type-erased, shared component.
pub type Component = Arc<dyn Any + Send + Sync>;

/// Order value of a processor that must run before all others.
pub const HIGHEST_PRECEDENCE: i32 = i32::MIN;

/// Order value of a processor that must run after all others.
pub const LOWEST_PRECEDENCE: i32 = i32::MAX;

/// A hook invoked for every component during registry initialization.
pub trait ComponentPostProcessor: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Scheduling order among processors; lower runs first.
    fn order(&self) -> i32 {
        0
    }

    /// Checks that the processor received all of its dependencies.
    ///
    /// Called once, before any component is processed.
    fn validate(&self) -> LifecycleResult<()> {
        Ok(())
    }

    /// Called before the component's initialization completes.
    fn before_init(&self, component: Component, _name: &str) -> LifecycleResult<Component> {
        Ok(component)
    }

    /// Called after the component's initialization completes.
    fn after_init(&self, component: Component, name: &str) -> LifecycleResult<Component>;
}

/// Registry of named components.
#[derive(Default)]
pub struct ComponentRegistry {
    components: IndexMap<String, Component>,
    processors: Vec<Arc<dyn ComponentPostProcessor>>,
    initialized: bool,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::DuplicateComponent`] if the name is taken.
    pub fn register<T: Send + Sync + 'static>(
        &mut self,
        name: impl Into<String>,
        component: Arc<T>,
    ) -> LifecycleResult<()> {
        let name = name.into();
        if self.components.contains_key(&name) {
            return Err(LifecycleError::DuplicateComponent(name));
        }
        self.components.insert(name, component);
        Ok(())
    }

    /// Adds a post-processor.
    pub fn add_post_processor(&mut self, processor: Arc<dyn ComponentPostProcessor>) {
        self.processors.push(processor);
    }

    /// Runs every post-processor over every component.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a processor, or
    /// [`LifecycleError::AlreadyInitialized`] on a second call.
    pub fn initialize(&mut self) -> LifecycleResult<()> {
        if self.initialized {
            return Err(LifecycleError::AlreadyInitialized);
        }
        self.initialized = true;

        // Stable sort: equal orders keep registration order.
        self.processors.sort_by_key(|p| p.order());

        for processor in &self.processors {
            processor.validate()?;
        }

        info!(
            components = self.components.len(),
            processors = self.processors.len(),
            "initializing components"
        );

        for (name, slot) in &mut self.components {
            let mut component = Arc::clone(slot);
            for processor in &self.processors {
                component = processor.before_init(component, name)?;
            }
            for processor in &self.processors {
                debug!(component = %name, processor = processor.name(), "after_init");
                component = processor.after_init(component, name)?;
            }
            *slot = component;
        }

        Ok(())
    }

    /// Returns `true` once [`initialize`](Self::initialize) has been called.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns the component registered under `name`, if it has type `T`.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.components
            .get(name)
            .and_then(|c| Arc::clone(c).downcast::<T>().ok())
    }

    /// Returns `true` if a component is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Names of all components in registration order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    /// Names of all post-processors in their current order.
    pub fn processor_names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Returns the number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if no components are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .field("processors", &self.processor_names())
            .field("initialized", &self.initialized)
            .finish()
    }
}
