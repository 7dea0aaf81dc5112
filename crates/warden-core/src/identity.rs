//! Caller identity.
//!
//! Identity is established by the identity filter from headers set by the
//! ingress gateway and read by the authorization filters further down the
//! chain.

use serde::{Deserialize, Serialize};

/// The authenticated identity of a caller.
///
/// # Example
///
/// ```
/// use warden_core::CallerIdentity;
///
/// let identity = CallerIdentity::user("u-42")
///     .with_roles(["admin"])
///     .with_permissions(["user:read"]);
///
/// assert_eq!(identity.log_id(), "user:u-42");
/// assert!(identity.has_role("admin"));
/// assert!(identity.has_permission("user:read"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallerIdentity {
    /// A workload identified by a SPIFFE ID (service-to-service traffic).
    Spiffe {
        /// The full SPIFFE ID, e.g. `spiffe://example.org/billing`.
        spiffe_id: String,
    },
    /// An end user.
    User {
        /// Stable user identifier.
        user_id: String,
        /// Roles granted to the user.
        roles: Vec<String>,
        /// Fine-grained permission codes granted to the user.
        permissions: Vec<String>,
    },
    /// An external integration authenticated with an API key.
    ApiKey {
        /// Identifier of the key (never the secret).
        key_id: String,
        /// Scopes attached to the key.
        scopes: Vec<String>,
    },
    /// No credentials were presented.
    #[default]
    Anonymous,
}

impl CallerIdentity {
    /// Creates a SPIFFE identity.
    pub fn spiffe(spiffe_id: impl Into<String>) -> Self {
        Self::Spiffe {
            spiffe_id: spiffe_id.into(),
        }
    }

    /// Creates a user identity with no roles or permissions.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::User {
            user_id: user_id.into(),
            roles: Vec::new(),
            permissions: Vec::new(),
        }
    }

    /// Creates an API key identity.
    pub fn api_key<I>(key_id: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::ApiKey {
            key_id: key_id.into(),
            scopes: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// Replaces the roles of a user identity. No-op for other kinds.
    #[must_use]
    pub fn with_roles<I>(mut self, new_roles: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        if let Self::User { roles, .. } = &mut self {
            *roles = new_roles.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Replaces the permissions of a user identity. No-op for other kinds.
    #[must_use]
    pub fn with_permissions<I>(mut self, new_permissions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        if let Self::User { permissions, .. } = &mut self {
            *permissions = new_permissions.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Returns `true` for [`CallerIdentity::Anonymous`].
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// Returns a string identifier suitable for logging.
    ///
    /// Never contains secrets.
    pub fn log_id(&self) -> String {
        match self {
            Self::Spiffe { spiffe_id } => spiffe_id.clone(),
            Self::User { user_id, .. } => format!("user:{user_id}"),
            Self::ApiKey { key_id, .. } => format!("apikey:{key_id}"),
            Self::Anonymous => "anonymous".to_string(),
        }
    }

    /// Returns the roles used for role-based authorization.
    ///
    /// SPIFFE identities get a single `spiffe:<trust-domain>` role and API
    /// keys a single `api_key:<key_id>` role.
    pub fn roles(&self) -> Vec<String> {
        match self {
            Self::Spiffe { spiffe_id } => spiffe_id
                .strip_prefix("spiffe://")
                .and_then(|rest| rest.split('/').next())
                .map(|domain| vec![format!("spiffe:{domain}")])
                .unwrap_or_default(),
            Self::User { roles, .. } => roles.clone(),
            Self::ApiKey { key_id, .. } => vec![format!("api_key:{key_id}")],
            Self::Anonymous => Vec::new(),
        }
    }

    /// Returns `true` if the identity carries `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| r == role)
    }

    /// Returns `true` if the identity was granted `permission`.
    ///
    /// API key scopes count as permissions.
    pub fn has_permission(&self, permission: &str) -> bool {
        match self {
            Self::User { permissions, .. } => permissions.iter().any(|p| p == permission),
            Self::ApiKey { scopes, .. } => scopes.iter().any(|s| s == permission),
            Self::Spiffe { .. } | Self::Anonymous => false,
        }
    }
}
