//! Regular-expression permission filter.
//!
//! Guards requests with an ordered list of [`PatternRule`]s. The first rule
//! whose method and path pattern match the request decides the outcome: the
//! caller must hold the rule's permission code, otherwise the request is
//! rejected with `403 PERMISSION_DENIED`. Requests that no rule matches pass
//! through untouched, leaving the decision to later filters.
//!
//! The filter is only placed into the catch-all chain when the domain
//! enables [`PermissionControlType::RegularPattern`](warden_core::PermissionControlType).
//!
//! # Example
//!
//! ```
//! use http::Method;
//! use warden_middleware::stages::{PatternPermissionFilter, PatternRule};
//!
//! let filter = PatternPermissionFilter::new(vec![
//!     PatternRule::new(r"^/api/users/\d+$", "user:read")?.with_method(Method::GET),
//!     PatternRule::new(r"^/api/users", "user:write")?,
//! ]);
//! assert_eq!(filter.rules().len(), 2);
//! # Ok::<(), regex::Error>(())
//! ```

use http::{Method, StatusCode};
use regex::Regex;
use tracing::{debug, info};

use crate::context::FilterContext;
use crate::filter::{BoxFuture, Filter, Next};
use crate::types::{Request, Response, ResponseExt};

/// A single permission rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    method: Option<Method>,
    pattern: Regex,
    permission: String,
}

impl PatternRule {
    /// Creates a rule matching any method.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid regular expression.
    pub fn new(pattern: &str, permission: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            method: None,
            pattern: Regex::new(pattern)?,
            permission: permission.into(),
        })
    }

    /// Restricts the rule to `method`.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// The method restriction, if any.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// The path pattern source.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// The permission code a caller must hold.
    pub fn permission(&self) -> &str {
        &self.permission
    }

    /// Returns `true` if the rule applies to `method` and `path`.
    pub fn matches(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().map_or(true, |m| m == method) && self.pattern.is_match(path)
    }
}

/// Decision recorded in the context when a rule matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternPermissionDecision {
    /// Pattern of the deciding rule.
    pub pattern: String,
    /// Permission the rule required.
    pub permission: String,
    /// Whether the caller held it.
    pub allowed: bool,
}

/// Filter enforcing [`PatternRule`]s.
#[derive(Debug, Clone, Default)]
pub struct PatternPermissionFilter {
    rules: Vec<PatternRule>,
}

impl PatternPermissionFilter {
    /// Creates a filter with rules evaluated in order.
    pub fn new(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// The configured rules.
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Returns the first rule applying to the request, if any.
    pub fn rule_for(&self, method: &Method, path: &str) -> Option<&PatternRule> {
        self.rules.iter().find(|r| r.matches(method, path))
    }
}

impl Filter for PatternPermissionFilter {
    fn name(&self) -> &'static str {
        "pattern_permission"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut FilterContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let Some(rule) = self.rule_for(request.method(), request.uri().path()) else {
                return next.run(ctx, request).await;
            };

            let allowed = ctx.identity().has_permission(rule.permission());
            ctx.set_extension(PatternPermissionDecision {
                pattern: rule.pattern().to_string(),
                permission: rule.permission().to_string(),
                allowed,
            });

            if allowed {
                debug!(
                    request_id = %ctx.request_id(),
                    pattern = rule.pattern(),
                    permission = rule.permission(),
                    "pattern permission granted"
                );
                return next.run(ctx, request).await;
            }

            info!(
                request_id = %ctx.request_id(),
                caller = %ctx.identity().log_id(),
                path = request.uri().path(),
                pattern = rule.pattern(),
                permission = rule.permission(),
                "pattern permission denied"
            );
            Response::json_error(
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                &format!("missing permission '{}'", rule.permission()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Request as HttpRequest;
    use http_body_util::Full;
    use warden_core::CallerIdentity;

    fn make_request(method: Method, path: &str) -> Request {
        HttpRequest::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn create_handler() -> impl FnOnce(&mut FilterContext, Request) -> BoxFuture<'static, Response> {
        |_ctx, _req| Box::pin(async { Response::new(Full::new(Bytes::from("OK"))) })
    }

    fn filter() -> PatternPermissionFilter {
        PatternPermissionFilter::new(vec![
            PatternRule::new(r"^/api/users/\d+$", "user:read")
                .unwrap()
                .with_method(Method::GET),
            PatternRule::new(r"^/api/users", "user:write").unwrap(),
        ])
    }

    async fn run(ctx: &mut FilterContext, method: Method, path: &str) -> StatusCode {
        filter()
            .process(ctx, make_request(method, path), Next::handler(create_handler()))
            .await
            .status()
    }

    #[tokio::test]
    async fn test_unmatched_request_passes_without_decision() {
        let mut ctx = FilterContext::new();
        assert_eq!(run(&mut ctx, Method::GET, "/health").await, StatusCode::OK);
        assert!(ctx.get_extension::<PatternPermissionDecision>().is_none());
    }

    #[tokio::test]
    async fn test_first_matching_rule_decides() {
        let mut ctx = FilterContext::new();
        ctx.set_identity(CallerIdentity::user("u-1").with_permissions(["user:read"]));

        assert_eq!(run(&mut ctx, Method::GET, "/api/users/7").await, StatusCode::OK);
        assert_eq!(
            ctx.get_extension::<PatternPermissionDecision>().unwrap().permission,
            "user:read"
        );

        // DELETE skips the GET-only rule and hits the write rule.
        assert_eq!(
            run(&mut ctx, Method::DELETE, "/api/users/7").await,
            StatusCode::FORBIDDEN
        );
        let decision = ctx.get_extension::<PatternPermissionDecision>().unwrap();
        assert_eq!(decision.permission, "user:write");
        assert!(!decision.allowed);
    }

    #[tokio::test]
    async fn test_anonymous_denied_on_guarded_path() {
        let mut ctx = FilterContext::new();
        assert_eq!(run(&mut ctx, Method::POST, "/api/users").await, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_api_key_scopes_count_as_permissions() {
        let mut ctx = FilterContext::new();
        ctx.set_identity(CallerIdentity::api_key("key-1", ["user:write"]));
        assert_eq!(run(&mut ctx, Method::POST, "/api/users").await, StatusCode::OK);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        assert!(PatternRule::new("[unclosed", "x").is_err());
    }

    #[test]
    fn test_empty_filter_matches_nothing() {
        let filter = PatternPermissionFilter::default();
        assert!(filter.rule_for(&Method::GET, "/anything").is_none());
        assert_eq!(filter.name(), "pattern_permission");
    }
}
