//! Security filter chains.

use std::fmt;

use crate::filter::BoxedFilter;
use crate::matcher::RequestMatcher;
use crate::types::Request;

/// A matcher plus the ordered filters applied to the requests it selects.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use warden_middleware::stages::RequestIdFilter;
/// use warden_middleware::SecurityFilterChain;
///
/// let chain = SecurityFilterChain::any_request(vec![Arc::new(RequestIdFilter::new())]);
/// assert!(chain.matcher().is_match_all());
/// assert_eq!(chain.filter_names(), ["request_id"]);
/// ```
#[derive(Clone)]
pub struct SecurityFilterChain {
    matcher: RequestMatcher,
    filters: Vec<BoxedFilter>,
}

impl SecurityFilterChain {
    /// Creates a chain with the given matcher and filters.
    pub fn new(matcher: RequestMatcher, filters: Vec<BoxedFilter>) -> Self {
        Self { matcher, filters }
    }

    /// Creates a chain that applies to every request.
    pub fn any_request(filters: Vec<BoxedFilter>) -> Self {
        Self::new(RequestMatcher::AnyRequest, filters)
    }

    /// Returns the chain's matcher.
    pub fn matcher(&self) -> &RequestMatcher {
        &self.matcher
    }

    /// Returns the filters in execution order.
    pub fn filters(&self) -> &[BoxedFilter] {
        &self.filters
    }

    /// Returns the filter list for in-place mutation.
    pub fn filters_mut(&mut self) -> &mut Vec<BoxedFilter> {
        &mut self.filters
    }

    /// Returns the filter names in execution order.
    pub fn filter_names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Returns `true` if this chain applies to `request`.
    pub fn matches(&self, request: &Request) -> bool {
        self.matcher.matches(request)
    }
}

impl fmt::Debug for SecurityFilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityFilterChain")
            .field("matcher", &self.matcher.describe())
            .field("filters", &self.filter_names())
            .finish()
    }
}
