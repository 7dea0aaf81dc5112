//! # Warden Middleware
//!
//! Security filter chains for Warden services, and the startup hook that
//! splices the regular-pattern permission filter into them.
//!
//! ## Dispatch
//!
//! ```text
//! Request → FilterChainProxy → first matching SecurityFilterChain
//!                                  ↓
//!           RequestId → Identity → [PatternPermission] → Authorization → Handler
//! ```
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Filter`] | One request-processing unit |
//! | [`RequestMatcher`] | Selects the chain for a request |
//! | [`SecurityFilterChain`] | Matcher plus ordered filters |
//! | [`FilterChainProxy`] | All chains, first-match dispatch |
//! | [`ChainAugmentor`] | Inserts a custom filter at startup |
//!
//! ## Startup augmentation
//!
//! The proxy is registered in the component registry under
//! [`FILTER_CHAIN_PROXY_NAME`]. [`ChainAugmentor`] runs as the last
//! post-processor and, when the domain enables
//! [`RegularPattern`](warden_core::PermissionControlType::RegularPattern)
//! control, inserts its filter immediately before the
//! [`AuthorizationFilter`](stages::AuthorizationFilter) of the catch-all chain.
//! See [`augment`] for the full placement rules.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use warden_middleware::stages::{AuthorizationFilter, IdentityFilter, RequestIdFilter};
//! use warden_middleware::{FilterChainProxy, RequestMatcher, SecurityFilterChain};
//!
//! let proxy = FilterChainProxy::new(vec![
//!     SecurityFilterChain::new(RequestMatcher::path_prefix("/health"), vec![]),
//!     SecurityFilterChain::any_request(vec![
//!         Arc::new(RequestIdFilter::trust_incoming()),
//!         Arc::new(IdentityFilter::new()),
//!         Arc::new(AuthorizationFilter::authenticated()),
//!     ]),
//! ]);
//! assert_eq!(proxy.chain_count(), 2);
//! ```

#![doc(html_root_url = "https://docs.rs/warden-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod augment;
pub mod chain;
pub mod context;
pub mod filter;
pub mod matcher;
pub mod proxy;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use augment::{
    AppendPath, Augmentation, ChainAugmentor, PipelineAugmentation, PipelineAugmenter,
    CHAIN_AUGMENTOR_NAME,
};
pub use chain::SecurityFilterChain;
pub use context::FilterContext;
pub use filter::{AsAny, BoxFuture, BoxedFilter, Filter, FnFilter, Handler, Next};
pub use matcher::RequestMatcher;
pub use proxy::{FilterChainProxy, FILTER_CHAIN_PROXY_NAME};
pub use types::{Request, Response, ResponseExt};
