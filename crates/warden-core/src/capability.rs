//! Domain capability flags.
//!
//! A domain (one protected application) declares which permission control
//! types it supports. Components query the capability service at the moment
//! they need an answer; the answer is never cached, so a domain may decide
//! its control types after the components that consult them were built.
//!
//! # Example
//!
//! ```
//! use warden_core::{ControlTypeSupport, DomainDefine, PermissionControlType};
//!
//! let domain = DomainDefine::new("techops");
//! assert!(!domain.control_type_support(PermissionControlType::RegularPattern));
//!
//! domain.set_control_types([PermissionControlType::RegularPattern]);
//! assert!(domain.control_type_support(PermissionControlType::RegularPattern));
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// How a domain expresses its permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionControlType {
    /// Plain URI patterns checked by the standard authorization filter.
    UriPattern,
    /// Regular-expression permission rules checked by the pattern permission filter.
    RegularPattern,
}

impl PermissionControlType {
    /// Returns the snake_case name used in configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UriPattern => "uri_pattern",
            Self::RegularPattern => "regular_pattern",
        }
    }
}

impl fmt::Display for PermissionControlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionControlType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uri_pattern" => Ok(Self::UriPattern),
            "regular_pattern" => Ok(Self::RegularPattern),
            other => Err(format!("unknown permission control type '{other}'")),
        }
    }
}

/// Capability check consulted by feature-switched components.
///
/// Implementations must be side-effect free and safe to call concurrently.
pub trait ControlTypeSupport: Send + Sync {
    /// Returns `true` if the domain supports `control_type`.
    fn control_type_support(&self, control_type: PermissionControlType) -> bool;
}

/// The capability service for one domain.
#[derive(Debug)]
pub struct DomainDefine {
    domain_code: String,
    control_types: RwLock<HashSet<PermissionControlType>>,
}

impl DomainDefine {
    /// Creates a domain with no control types enabled.
    pub fn new(domain_code: impl Into<String>) -> Self {
        Self {
            domain_code: domain_code.into(),
            control_types: RwLock::new(HashSet::new()),
        }
    }

    /// Creates a domain with the given control types enabled.
    pub fn with_control_types<I>(domain_code: impl Into<String>, control_types: I) -> Self
    where
        I: IntoIterator<Item = PermissionControlType>,
    {
        let domain = Self::new(domain_code);
        domain.set_control_types(control_types);
        domain
    }

    /// Returns the domain code.
    pub fn domain_code(&self) -> &str {
        &self.domain_code
    }

    /// Replaces the enabled control types.
    pub fn set_control_types<I>(&self, control_types: I)
    where
        I: IntoIterator<Item = PermissionControlType>,
    {
        *self.control_types.write() = control_types.into_iter().collect();
    }

    /// Returns the enabled control types in a stable order.
    pub fn control_types(&self) -> Vec<PermissionControlType> {
        let mut types: Vec<_> = self.control_types.read().iter().copied().collect();
        types.sort_by_key(|t| t.as_str());
        types
    }
}

impl ControlTypeSupport for DomainDefine {
    fn control_type_support(&self, control_type: PermissionControlType) -> bool {
        self.control_types.read().contains(&control_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_parse_control_type() {
        assert_eq!(
            "regular_pattern".parse::<PermissionControlType>(),
            Ok(PermissionControlType::RegularPattern)
        );
        assert_eq!(
            " URI_PATTERN ".parse::<PermissionControlType>(),
            Ok(PermissionControlType::UriPattern)
        );
        assert!("glob".parse::<PermissionControlType>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&PermissionControlType::RegularPattern).unwrap();
        assert_eq!(json, "\"regular_pattern\"");
    }

    #[test]
    fn test_domain_answers_follow_later_updates() {
        let domain = DomainDefine::with_control_types("ops", [PermissionControlType::UriPattern]);
        assert!(domain.control_type_support(PermissionControlType::UriPattern));
        assert!(!domain.control_type_support(PermissionControlType::RegularPattern));

        domain.set_control_types([PermissionControlType::RegularPattern]);
        assert!(!domain.control_type_support(PermissionControlType::UriPattern));
        assert!(domain.control_type_support(PermissionControlType::RegularPattern));
    }

    #[test]
    fn test_control_types_sorted() {
        let domain = DomainDefine::with_control_types(
            "ops",
            [
                PermissionControlType::UriPattern,
                PermissionControlType::RegularPattern,
            ],
        );
        assert_eq!(
            domain.control_types(),
            vec![
                PermissionControlType::RegularPattern,
                PermissionControlType::UriPattern
            ]
        );
        assert_eq!(domain.domain_code(), "ops");
    }

    #[test]
    fn test_concurrent_reads() {
        let domain = Arc::new(DomainDefine::with_control_types(
            "ops",
            [PermissionControlType::RegularPattern],
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let domain = Arc::clone(&domain);
                std::thread::spawn(move || {
                    (0..100).all(|_| domain.control_type_support(PermissionControlType::RegularPattern))
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
