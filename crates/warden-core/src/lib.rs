//! # Warden Core
//!
//! Core types shared by every Warden crate.
//!
//! - [`CallerIdentity`] - Authenticated caller identity (SPIFFE, User, ApiKey, Anonymous)
//! - [`RequestId`] - UUID v7 request identifier
//! - [`capability`] - Domain capability flags, including the pattern-permission switch
//! - [`attribute`] - Static mapping of user attributes to storage columns
//! - [`di`] - Typed service container used to inject startup dependencies
//! - [`lifecycle`] - Named component registry with post-processor hooks
//! - [`LifecycleError`] - Fatal startup errors

#![doc(html_root_url = "https://docs.rs/warden-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod attribute;
pub mod capability;
mod context;
pub mod di;
mod error;
mod identity;
pub mod lifecycle;

pub use attribute::{AttributeDefine, AttributeTable};
pub use capability::{ControlTypeSupport, DomainDefine, PermissionControlType};
pub use context::RequestId;
pub use di::Container;
pub use error::{LifecycleError, LifecycleResult};
pub use identity::CallerIdentity;
pub use lifecycle::{
    Component, ComponentPostProcessor, ComponentRegistry, HIGHEST_PRECEDENCE, LOWEST_PRECEDENCE,
};
