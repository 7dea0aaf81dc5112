//! Identity filter.
//!
//! Establishes the [`CallerIdentity`] from headers set by the ingress or
//! sidecar in front of the service. Credentials themselves are verified
//! upstream; this filter only reads the results.
//!
//! ## Identity Precedence
//!
//! 1. `x-spiffe-id` - workload identity (service-to-service)
//! 2. `x-api-key` - external integration; scopes from `x-api-scopes`
//! 3. `x-user-id` - end user; roles from `x-user-roles`, permissions from
//!    `x-user-permissions` (comma separated)
//! 4. Anonymous

use warden_core::CallerIdentity;

use crate::context::FilterContext;
use crate::filter::{BoxFuture, Filter, Next};
use crate::types::{Request, Response};

/// Header carrying the caller's SPIFFE ID.
pub const SPIFFE_ID_HEADER: &str = "x-spiffe-id";

/// Header carrying the API key id.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the scopes of the API key.
pub const API_SCOPES_HEADER: &str = "x-api-scopes";

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the user's roles.
pub const USER_ROLES_HEADER: &str = "x-user-roles";

/// Header carrying the user's permission codes.
pub const USER_PERMISSIONS_HEADER: &str = "x-user-permissions";

/// Filter that populates [`FilterContext::identity`].
#[derive(Debug, Clone, Default)]
pub struct IdentityFilter {
    trusted_trust_domain: Option<String>,
}

impl IdentityFilter {
    /// Creates an identity filter that accepts any SPIFFE trust domain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an identity filter that only accepts SPIFFE IDs from
    /// `trust_domain`.
    #[must_use]
    pub fn with_trust_domain(trust_domain: impl Into<String>) -> Self {
        Self {
            trusted_trust_domain: Some(trust_domain.into()),
        }
    }

    /// Resolves the identity carried by `request`.
    pub fn extract(&self, request: &Request) -> CallerIdentity {
        self.extract_spiffe_identity(request)
            .or_else(|| extract_api_key_identity(request))
            .or_else(|| extract_user_identity(request))
            .unwrap_or_default()
    }

    fn extract_spiffe_identity(&self, request: &Request) -> Option<CallerIdentity> {
        let spiffe_id = header(request, SPIFFE_ID_HEADER)?;
        let domain = spiffe_id.strip_prefix("spiffe://")?.split('/').next()?;
        if domain.is_empty() {
            return None;
        }
        if let Some(trusted) = &self.trusted_trust_domain {
            if domain != trusted {
                return None;
            }
        }
        Some(CallerIdentity::spiffe(spiffe_id))
    }
}

fn extract_api_key_identity(request: &Request) -> Option<CallerIdentity> {
    let key_id = header(request, API_KEY_HEADER)?;
    Some(CallerIdentity::api_key(key_id, list_header(request, API_SCOPES_HEADER)))
}

fn extract_user_identity(request: &Request) -> Option<CallerIdentity> {
    let user_id = header(request, USER_ID_HEADER)?;
    Some(
        CallerIdentity::user(user_id)
            .with_roles(list_header(request, USER_ROLES_HEADER))
            .with_permissions(list_header(request, USER_PERMISSIONS_HEADER)),
    )
}

/// Non-empty, trimmed header value.
fn header<'r>(request: &'r Request, name: &str) -> Option<&'r str> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn list_header(request: &Request, name: &str) -> Vec<String> {
    header(request, name)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

impl Filter for IdentityFilter {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut FilterContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let identity = self.extract(&request);
            tracing::debug!(
                request_id = %ctx.request_id(),
                caller = %identity.log_id(),
                "caller identified"
            );
            ctx.set_identity(identity);
            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::Request as HttpRequest;
    use http_body_util::Full;

    fn request_with(headers: &[(&str, &str)]) -> Request {
        let mut builder = HttpRequest::builder().uri("/test");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    fn create_handler() -> impl FnOnce(&mut FilterContext, Request) -> BoxFuture<'static, Response> {
        |_ctx, _req| Box::pin(async { Response::new(Full::new(Bytes::new())) })
    }

    #[tokio::test]
    async fn test_anonymous_when_no_credentials() {
        let filter = IdentityFilter::new();
        let mut ctx = FilterContext::new();
        ctx.set_identity(CallerIdentity::user("stale"));

        filter
            .process(&mut ctx, request_with(&[]), Next::handler(create_handler()))
            .await;

        assert!(ctx.identity().is_anonymous());
    }

    #[tokio::test]
    async fn test_user_identity_with_roles_and_permissions() {
        let filter = IdentityFilter::new();
        let mut ctx = FilterContext::new();
        let request = request_with(&[
            (USER_ID_HEADER, "u-1"),
            (USER_ROLES_HEADER, "admin, auditor"),
            (USER_PERMISSIONS_HEADER, "user:read,,user:write"),
        ]);

        filter.process(&mut ctx, request, Next::handler(create_handler())).await;

        assert_eq!(
            ctx.identity(),
            &CallerIdentity::user("u-1")
                .with_roles(["admin", "auditor"])
                .with_permissions(["user:read", "user:write"])
        );
    }

    #[test]
    fn test_precedence() {
        let filter = IdentityFilter::new();
        let all = request_with(&[
            (SPIFFE_ID_HEADER, "spiffe://example.org/billing"),
            (API_KEY_HEADER, "key-1"),
            (USER_ID_HEADER, "u-1"),
        ]);
        assert_eq!(
            filter.extract(&all),
            CallerIdentity::spiffe("spiffe://example.org/billing")
        );

        let key_and_user = request_with(&[
            (API_KEY_HEADER, "key-1"),
            (API_SCOPES_HEADER, "users:read"),
            (USER_ID_HEADER, "u-1"),
        ]);
        assert_eq!(
            filter.extract(&key_and_user),
            CallerIdentity::api_key("key-1", ["users:read"])
        );
    }

    #[test]
    fn test_invalid_spiffe_id_falls_through() {
        let filter = IdentityFilter::new();
        let request = request_with(&[(SPIFFE_ID_HEADER, "not-spiffe"), (USER_ID_HEADER, "u-1")]);
        assert_eq!(filter.extract(&request), CallerIdentity::user("u-1"));
    }

    #[test]
    fn test_trust_domain_enforced() {
        let filter = IdentityFilter::with_trust_domain("example.org");
        let trusted = request_with(&[(SPIFFE_ID_HEADER, "spiffe://example.org/svc")]);
        let foreign = request_with(&[(SPIFFE_ID_HEADER, "spiffe://evil.org/svc")]);

        assert!(matches!(filter.extract(&trusted), CallerIdentity::Spiffe { .. }));
        assert!(filter.extract(&foreign).is_anonymous());
    }
}
