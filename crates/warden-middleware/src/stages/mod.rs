//! Standard filters.
//!
//! A typical catch-all chain runs them in this order:
//!
//! 1. [`request_id`] - Generate/propagate request id
//! 2. [`identity`] - Establish caller identity
//! 3. [`pattern_permission`] - Regex permission rules (inserted at startup
//!    when the domain enables them)
//! 4. [`authorization`] - Final access decision

pub mod authorization;
pub mod identity;
pub mod pattern_permission;
pub mod request_id;

pub use authorization::{AuthorizationFilter, AuthorizationResult, PolicyDecision, RbacBuilder};
pub use identity::IdentityFilter;
pub use pattern_permission::{PatternPermissionDecision, PatternPermissionFilter, PatternRule};
pub use request_id::RequestIdFilter;
