//! Per-request filter context.
//!
//! The [`FilterContext`] carries state from one filter to the next: the
//! request id, the caller identity established by the identity filter, and
//! typed extensions such as authorization decisions.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use warden_core::{CallerIdentity, RequestId};

/// Context that flows through a filter chain.
///
/// # Example
///
/// ```
/// use warden_core::CallerIdentity;
/// use warden_middleware::FilterContext;
///
/// let mut ctx = FilterContext::new();
/// ctx.set_identity(CallerIdentity::user("u-1").with_roles(["admin"]));
///
/// assert!(ctx.identity().has_role("admin"));
/// ```
#[derive(Debug)]
pub struct FilterContext {
    request_id: RequestId,
    identity: CallerIdentity,
    started_at: Instant,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl FilterContext {
    /// Creates a context with a fresh request id and an anonymous caller.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a context with a specific request id.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            identity: CallerIdentity::Anonymous,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request id.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Sets the request id.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns the caller identity.
    #[must_use]
    pub fn identity(&self) -> &CallerIdentity {
        &self.identity
    }

    /// Sets the caller identity.
    pub fn set_identity(&mut self, identity: CallerIdentity) {
        self.identity = identity;
    }

    /// Returns the elapsed time since the request entered the chain.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension value, replacing any previous one.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }
}

impl Default for FilterContext {
    fn default() -> Self {
        Self::new()
    }
}
