//! Request matchers that select a filter chain.

use http::Method;
use regex::Regex;

use crate::types::Request;

/// A predicate over requests deciding whether a chain applies.
///
/// # Example
///
/// ```
/// use warden_middleware::RequestMatcher;
///
/// let admin = RequestMatcher::path_prefix("/admin");
/// assert!(!admin.is_match_all());
/// assert!(RequestMatcher::AnyRequest.is_match_all());
/// ```
#[derive(Debug, Clone)]
pub enum RequestMatcher {
    /// Matches every request.
    AnyRequest,
    /// Matches requests whose path starts with the prefix.
    PathPrefix(String),
    /// Matches requests whose path matches the regular expression.
    PathPattern(Regex),
    /// Matches requests with the method that also satisfy the inner matcher.
    Method(Method, Box<RequestMatcher>),
}

impl RequestMatcher {
    /// Creates a path prefix matcher.
    pub fn path_prefix(prefix: impl Into<String>) -> Self {
        Self::PathPrefix(prefix.into())
    }

    /// Creates a path pattern matcher.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn path_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::PathPattern)
    }

    /// Restricts `inner` to requests with `method`.
    #[must_use]
    pub fn method(method: Method, inner: RequestMatcher) -> Self {
        Self::Method(method, Box::new(inner))
    }

    /// Returns `true` if the matcher selects `request`.
    pub fn matches(&self, request: &Request) -> bool {
        let path = request.uri().path();
        match self {
            Self::AnyRequest => true,
            Self::PathPrefix(prefix) => path.starts_with(prefix.as_str()),
            Self::PathPattern(regex) => regex.is_match(path),
            Self::Method(method, inner) => request.method() == method && inner.matches(request),
        }
    }

    /// Returns `true` if the matcher unconditionally matches every request.
    ///
    /// Only [`RequestMatcher::AnyRequest`] qualifies. A prefix of `/` or a
    /// pattern like `.*` is not treated as match-all.
    pub const fn is_match_all(&self) -> bool {
        matches!(self, Self::AnyRequest)
    }

    /// Human-readable form used in logs.
    pub fn describe(&self) -> String {
        match self {
            Self::AnyRequest => "any request".to_string(),
            Self::PathPrefix(prefix) => format!("prefix {prefix}"),
            Self::PathPattern(regex) => format!("pattern {}", regex.as_str()),
            Self::Method(method, inner) => format!("{method} {}", inner.describe()),
        }
    }
}
