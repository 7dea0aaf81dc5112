//! Startup error types.
//!
//! Every variant of [`LifecycleError`] is fatal: component initialization
//! stops at the first error and the process must not start serving traffic.

use thiserror::Error;

/// Result type for lifecycle operations.
pub type LifecycleResult<T = ()> = Result<T, LifecycleError>;

/// Errors raised while wiring and initializing components at startup.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// A required dependency was never supplied to a component.
    #[error("component '{component}' is missing required dependency '{dependency}'")]
    MissingDependency {
        /// The component that needed the dependency.
        component: String,
        /// The dependency that was not supplied.
        dependency: String,
    },

    /// A component does not expose the shape another component relies on.
    #[error("component '{component}' is incompatible: {reason}")]
    IncompatibleHost {
        /// The offending component.
        component: String,
        /// What was missing or malformed.
        reason: String,
    },

    /// Two components were registered under the same name.
    #[error("a component named '{0}' is already registered")]
    DuplicateComponent(String),

    /// The registry was initialized more than once.
    #[error("component registry has already been initialized")]
    AlreadyInitialized,

    /// A post-processor failed for another reason.
    #[error("lifecycle hook '{hook}' failed: {message}")]
    Hook {
        /// Name of the failing post-processor.
        hook: String,
        /// Error message.
        message: String,
        /// Optional source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl LifecycleError {
    /// Creates a missing dependency error.
    pub fn missing_dependency(component: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self::MissingDependency {
            component: component.into(),
            dependency: dependency.into(),
        }
    }

    /// Creates an incompatible host error.
    pub fn incompatible_host(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IncompatibleHost {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Creates a hook error with a source.
    pub fn hook(
        hook: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Hook {
            hook: hook.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
