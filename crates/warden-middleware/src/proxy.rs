//! The filter chain proxy: the single entry point that dispatches each
//! request through the first matching [`SecurityFilterChain`].
//!
//! The proxy is registered as a named component so that startup
//! post-processors can find it under [`FILTER_CHAIN_PROXY_NAME`] and adjust
//! its chains before any request is served.
//!
//! # Chain list availability
//!
//! A proxy may be constructed without a chain list at all
//! ([`FilterChainProxy::without_chains`]). Such a proxy reports `None` from
//! [`FilterChainProxy::filter_chains`] and lets every request reach the
//! handler unfiltered.
//!
//! # Sealed proxies
//!
//! A [`sealed`](FilterChainProxy::sealed) proxy rejects
//! [`append_chain`](FilterChainProxy::append_chain). Existing chains can
//! still be edited through [`filter_chains`](FilterChainProxy::filter_chains),
//! and [`internal_chain_list`](FilterChainProxy::internal_chain_list) remains
//! as a startup-only escape hatch for adding chains anyway.

use std::fmt;

use parking_lot::{MappedRwLockWriteGuard, RwLock, RwLockWriteGuard};
use tracing::debug;

use crate::chain::SecurityFilterChain;
use crate::context::FilterContext;
use crate::filter::{Handler, Next};
use crate::types::{Request, Response};

/// Name under which the proxy is registered in the component registry.
pub const FILTER_CHAIN_PROXY_NAME: &str = "warden.filterChainProxy";

/// Ordered set of filter chains with first-match dispatch.
pub struct FilterChainProxy {
    chains: RwLock<Option<Vec<SecurityFilterChain>>>,
    appendable: bool,
}

impl FilterChainProxy {
    /// Creates a proxy that accepts new chains.
    pub fn new(chains: Vec<SecurityFilterChain>) -> Self {
        Self {
            chains: RwLock::new(Some(chains)),
            appendable: true,
        }
    }

    /// Creates a proxy whose chain list cannot be extended through
    /// [`append_chain`](Self::append_chain).
    pub fn sealed(chains: Vec<SecurityFilterChain>) -> Self {
        Self {
            chains: RwLock::new(Some(chains)),
            appendable: false,
        }
    }

    /// Creates a proxy without a chain list.
    pub fn without_chains() -> Self {
        Self {
            chains: RwLock::new(None),
            appendable: false,
        }
    }

    /// Returns a mutable view of the chains, or `None` if the proxy has no
    /// chain list.
    ///
    /// Filters inside each chain may be edited; chains cannot be added or
    /// removed through this view.
    pub fn filter_chains(&self) -> Option<MappedRwLockWriteGuard<'_, [SecurityFilterChain]>> {
        RwLockWriteGuard::try_map(self.chains.write(), |chains| {
            chains.as_mut().map(Vec::as_mut_slice)
        })
        .ok()
    }

    /// Returns `true` if [`append_chain`](Self::append_chain) is supported.
    pub fn supports_append(&self) -> bool {
        self.appendable && self.chains.read().is_some()
    }

    /// Appends a chain after all existing chains.
    ///
    /// # Errors
    ///
    /// Hands the chain back if the proxy is sealed or has no chain list.
    pub fn append_chain(&self, chain: SecurityFilterChain) -> Result<(), SecurityFilterChain> {
        if !self.appendable {
            return Err(chain);
        }
        match self.chains.write().as_mut() {
            Some(chains) => {
                chains.push(chain);
                Ok(())
            }
            None => Err(chain),
        }
    }

    /// Direct access to the underlying chain list.
    ///
    /// Bypasses sealing. Intended only for startup code that must add a
    /// chain to a proxy that does not support [`append_chain`](Self::append_chain).
    /// Returns `None` if the proxy has no chain list.
    #[doc(hidden)]
    pub fn internal_chain_list(&self) -> Option<MappedRwLockWriteGuard<'_, Vec<SecurityFilterChain>>> {
        RwLockWriteGuard::try_map(self.chains.write(), Option::as_mut).ok()
    }

    /// Returns the number of chains, `0` when the chain list is unavailable.
    pub fn chain_count(&self) -> usize {
        self.chains.read().as_ref().map_or(0, Vec::len)
    }

    /// Describes each chain as `matcher => [filter, ...]`.
    pub fn describe(&self) -> Vec<String> {
        self.chains
            .read()
            .as_ref()
            .map(|chains| {
                chains
                    .iter()
                    .map(|c| format!("{} => [{}]", c.matcher().describe(), c.filter_names().join(", ")))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Runs `request` through the first matching chain, then `handler`.
    ///
    /// When no chain matches, `handler` runs directly.
    pub async fn process(
        &self,
        ctx: &mut FilterContext,
        request: Request,
        handler: Handler<'_>,
    ) -> Response {
        // Clone the matched filters so the lock is released before awaiting.
        let filters = {
            let chains = self.chains.read();
            chains
                .as_ref()
                .and_then(|chains| chains.iter().find(|c| c.matches(&request)))
                .map(|chain| chain.filters().to_vec())
                .unwrap_or_default()
        };

        debug!(
            request_id = %ctx.request_id(),
            path = request.uri().path(),
            filters = filters.len(),
            "dispatching request"
        );

        Next::chain(&filters, handler).run(ctx, request).await
    }
}

impl fmt::Debug for FilterChainProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChainProxy")
            .field("chains", &self.describe())
            .field("appendable", &self.appendable)
            .finish()
    }
}
