//! Authorization decision filter.
//!
//! Decides whether the caller established by the identity filter may reach
//! the requested path. This is the well-known anchor that chain
//! augmentation positions custom filters against, so it normally sits near
//! the end of the catch-all chain:
//!
//! ```text
//! Request → RequestId → Identity → [Authorization] → Handler
//! ```
//!
//! # Modes
//!
//! - Allow-all (development)
//! - Deny-all (testing rejection flows)
//! - Authenticated: any non-anonymous caller
//! - Role-based: role → allowed path prefixes, `*` allows every path
//!
//! # Example
//!
//! ```
//! use warden_middleware::stages::AuthorizationFilter;
//!
//! let rbac = AuthorizationFilter::rbac()
//!     .allow_role("admin", ["*"])
//!     .allow_role("user", ["/api/users", "/api/profile"])
//!     .allow_anonymous_paths(["/health"])
//!     .build();
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, info};
use warden_core::CallerIdentity;

use crate::context::FilterContext;
use crate::filter::{BoxFuture, Filter, Next};
use crate::types::{Request, Response, ResponseExt};

/// Filter that enforces the access policy.
#[derive(Debug, Clone)]
pub struct AuthorizationFilter {
    mode: AuthorizationMode,
}

#[derive(Debug, Clone)]
enum AuthorizationMode {
    AllowAll,
    DenyAll,
    Authenticated,
    Rbac(Arc<RbacConfig>),
}

#[derive(Debug, Default)]
struct RbacConfig {
    /// Role name to allowed path prefixes.
    role_paths: HashMap<String, HashSet<String>>,
    anonymous_paths: HashSet<String>,
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Request is allowed.
    Allow,
    /// Request is denied.
    Deny {
        /// The reason for denial.
        reason: String,
    },
}

impl AuthorizationFilter {
    /// Allows every request.
    #[must_use]
    pub fn allow_all() -> Self {
        Self {
            mode: AuthorizationMode::AllowAll,
        }
    }

    /// Denies every request.
    #[must_use]
    pub fn deny_all() -> Self {
        Self {
            mode: AuthorizationMode::DenyAll,
        }
    }

    /// Allows any caller that is not anonymous.
    #[must_use]
    pub fn authenticated() -> Self {
        Self {
            mode: AuthorizationMode::Authenticated,
        }
    }

    /// Starts a role-based policy.
    #[must_use]
    pub fn rbac() -> RbacBuilder {
        RbacBuilder::default()
    }

    /// Evaluates the policy for `identity` requesting `path`.
    pub fn evaluate(&self, identity: &CallerIdentity, path: &str) -> PolicyDecision {
        match &self.mode {
            AuthorizationMode::AllowAll => PolicyDecision::Allow,
            AuthorizationMode::DenyAll => PolicyDecision::Deny {
                reason: "authorization denied (deny-all mode)".to_string(),
            },
            AuthorizationMode::Authenticated if identity.is_anonymous() => PolicyDecision::Deny {
                reason: "authentication required".to_string(),
            },
            AuthorizationMode::Authenticated => PolicyDecision::Allow,
            AuthorizationMode::Rbac(config) => Self::evaluate_rbac(config, identity, path),
        }
    }

    fn evaluate_rbac(config: &RbacConfig, identity: &CallerIdentity, path: &str) -> PolicyDecision {
        if config.anonymous_paths.iter().any(|p| path_allowed(p, path)) {
            return PolicyDecision::Allow;
        }
        if identity.is_anonymous() {
            return PolicyDecision::Deny {
                reason: "anonymous access not permitted".to_string(),
            };
        }

        let roles = identity.roles();
        let allowed = roles.iter().any(|role| {
            config
                .role_paths
                .get(role)
                .is_some_and(|paths| paths.iter().any(|p| path_allowed(p, path)))
        });

        if allowed {
            PolicyDecision::Allow
        } else {
            PolicyDecision::Deny {
                reason: format!("no role in {roles:?} grants access to '{path}'"),
            }
        }
    }
}

/// `*` allows everything; otherwise `prefix` must match whole path segments.
fn path_allowed(prefix: &str, path: &str) -> bool {
    if prefix == "*" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

impl Filter for AuthorizationFilter {
    fn name(&self) -> &'static str {
        "authorization"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut FilterContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let path = request.uri().path().to_string();

            match self.evaluate(ctx.identity(), &path) {
                PolicyDecision::Allow => {
                    debug!(request_id = %ctx.request_id(), path = %path, "authorization granted");
                    ctx.set_extension(AuthorizationResult {
                        allowed: true,
                        path,
                        reason: None,
                    });
                    next.run(ctx, request).await
                }
                PolicyDecision::Deny { reason } => {
                    info!(
                        request_id = %ctx.request_id(),
                        caller = %ctx.identity().log_id(),
                        path = %path,
                        reason = %reason,
                        "authorization denied"
                    );
                    let response =
                        Response::json_error(StatusCode::FORBIDDEN, "AUTHORIZATION_DENIED", &reason);
                    ctx.set_extension(AuthorizationResult {
                        allowed: false,
                        path,
                        reason: Some(reason),
                    });
                    response
                }
            }
        })
    }
}

/// Authorization outcome recorded in the context for auditing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResult {
    /// Whether the request was allowed.
    pub allowed: bool,
    /// The request path that was evaluated.
    pub path: String,
    /// Denial reason if not allowed.
    pub reason: Option<String>,
}

/// Builder for a role-based [`AuthorizationFilter`].
#[derive(Debug, Default)]
pub struct RbacBuilder {
    config: RbacConfig,
}

impl RbacBuilder {
    /// Allows `role` to reach the given path prefixes. `"*"` allows every path.
    #[must_use]
    pub fn allow_role<S, I>(mut self, role: S, paths: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.config
            .role_paths
            .entry(role.into())
            .or_default()
            .extend(paths.into_iter().map(Into::into));
        self
    }

    /// Allows every caller, anonymous included, to reach the given prefixes.
    #[must_use]
    pub fn allow_anonymous_paths<I>(mut self, paths: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.config
            .anonymous_paths
            .extend(paths.into_iter().map(Into::into));
        self
    }

    /// Builds the filter.
    #[must_use]
    pub fn build(self) -> AuthorizationFilter {
        AuthorizationFilter {
            mode: AuthorizationMode::Rbac(Arc::new(self.config)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Request as HttpRequest;
    use http_body_util::Full;

    fn make_request(path: &str) -> Request {
        HttpRequest::builder()
            .uri(path)
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn create_handler() -> impl FnOnce(&mut FilterContext, Request) -> BoxFuture<'static, Response> {
        |_ctx, _req| Box::pin(async { Response::new(Full::new(Bytes::from("success"))) })
    }

    async fn run(filter: &AuthorizationFilter, ctx: &mut FilterContext, path: &str) -> StatusCode {
        filter
            .process(ctx, make_request(path), Next::handler(create_handler()))
            .await
            .status()
    }

    fn user(roles: &[&str]) -> CallerIdentity {
        CallerIdentity::user("u-1").with_roles(roles.iter().copied())
    }

    #[test]
    fn test_filter_name() {
        assert_eq!(AuthorizationFilter::allow_all().name(), "authorization");
    }

    #[tokio::test]
    async fn test_allow_all_records_result() {
        let filter = AuthorizationFilter::allow_all();
        let mut ctx = FilterContext::new();

        assert_eq!(run(&filter, &mut ctx, "/x").await, StatusCode::OK);
        let result = ctx.get_extension::<AuthorizationResult>().unwrap();
        assert!(result.allowed);
        assert_eq!(result.path, "/x");
    }

    #[tokio::test]
    async fn test_deny_all_rejects() {
        let filter = AuthorizationFilter::deny_all();
        let mut ctx = FilterContext::new();

        assert_eq!(run(&filter, &mut ctx, "/x").await, StatusCode::FORBIDDEN);
        let result = ctx.get_extension::<AuthorizationResult>().unwrap();
        assert!(!result.allowed);
        assert!(result.reason.is_some());
    }

    #[tokio::test]
    async fn test_authenticated_mode() {
        let filter = AuthorizationFilter::authenticated();

        let mut anonymous = FilterContext::new();
        assert_eq!(run(&filter, &mut anonymous, "/x").await, StatusCode::FORBIDDEN);

        let mut known = FilterContext::new();
        known.set_identity(CallerIdentity::api_key("key-1", Vec::<String>::new()));
        assert_eq!(run(&filter, &mut known, "/x").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rbac_prefixes() {
        let filter = AuthorizationFilter::rbac()
            .allow_role("user", ["/api/users"])
            .allow_role("admin", ["*"])
            .build();

        let mut ctx = FilterContext::new();
        ctx.set_identity(user(&["user"]));
        assert_eq!(run(&filter, &mut ctx, "/api/users/7").await, StatusCode::OK);
        assert_eq!(run(&filter, &mut ctx, "/api/usersettings").await, StatusCode::FORBIDDEN);
        assert_eq!(run(&filter, &mut ctx, "/api/groups").await, StatusCode::FORBIDDEN);

        ctx.set_identity(user(&["admin"]));
        assert_eq!(run(&filter, &mut ctx, "/anything").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rbac_anonymous() {
        let filter = AuthorizationFilter::rbac()
            .allow_role("user", ["/api"])
            .allow_anonymous_paths(["/health"])
            .build();

        let mut ctx = FilterContext::new();
        assert_eq!(run(&filter, &mut ctx, "/health").await, StatusCode::OK);
        assert_eq!(run(&filter, &mut ctx, "/api").await, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_rbac_spiffe_and_api_key_roles() {
        let filter = AuthorizationFilter::rbac()
            .allow_role("spiffe:example.org", ["/internal"])
            .allow_role("api_key:key-1", ["/partner"])
            .build();

        let spiffe = CallerIdentity::spiffe("spiffe://example.org/billing");
        assert_eq!(filter.evaluate(&spiffe, "/internal/sync"), PolicyDecision::Allow);

        let key = CallerIdentity::api_key("key-1", Vec::<String>::new());
        assert_eq!(filter.evaluate(&key, "/partner"), PolicyDecision::Allow);
        assert!(matches!(
            filter.evaluate(&key, "/internal"),
            PolicyDecision::Deny { .. }
        ));
    }

    #[test]
    fn test_path_allowed() {
        assert!(path_allowed("*", "/x"));
        assert!(path_allowed("/api", "/api"));
        assert!(path_allowed("/api", "/api/v1"));
        assert!(path_allowed("/api/", "/api/v1"));
        assert!(!path_allowed("/api", "/apix"));
        assert!(!path_allowed("/api", "/"));
    }
}
