//! The filter trait and the continuation passed between filters.
//!
//! A filter receives the mutable [`FilterContext`], the request, and a
//! [`Next`] continuation. Calling [`Next::run`] hands the request to the
//! rest of the chain; returning without calling it short-circuits the chain
//! with the filter's own response.
//!
//! # Example
//!
//! ```
//! use warden_middleware::{BoxFuture, Filter, FilterContext, Next, Request, Response};
//!
//! struct Audit;
//!
//! impl Filter for Audit {
//!     fn name(&self) -> &'static str {
//!         "audit"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut FilterContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             tracing::info!(request_id = %ctx.request_id(), path = request.uri().path(), "audit");
//!             next.run(ctx, request).await
//!         })
//!     }
//! }
//! ```

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::FilterContext;
use crate::types::{Request, Response};

/// A boxed future that returns a response.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A filter shared between the chain that owns it and in-flight requests.
pub type BoxedFilter = Arc<dyn Filter>;

/// Terminal handler invoked after the last filter of a chain.
pub type Handler<'a> =
    Box<dyn FnOnce(&mut FilterContext, Request) -> BoxFuture<'static, Response> + Send + 'a>;

/// Upcast to [`Any`], implemented for every sized `'static` type.
///
/// Lets a chain identify filters by concrete type through
/// [`dyn Filter::is`](trait.Filter.html#method.is).
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A request-processing unit in a security filter chain.
///
/// # Invariants
///
/// - A filter calls `next.run()` at most once
/// - A filter that denies a request returns its own response instead
pub trait Filter: AsAny + Send + Sync + 'static {
    /// Short name used in logs and chain descriptions.
    fn name(&self) -> &'static str;

    /// Processes the request, optionally delegating to the rest of the chain.
    fn process<'a>(
        &'a self,
        ctx: &'a mut FilterContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

impl dyn Filter {
    /// Returns `true` if the filter's concrete type is `T`.
    pub fn is<T: Filter>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Returns the filter as `T` if that is its concrete type.
    pub fn downcast_ref<T: Filter>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl std::fmt::Debug for dyn Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Filter").field(&self.name()).finish()
    }
}

/// A filter built from a closure.
///
/// ```
/// use warden_middleware::{BoxFuture, FilterContext, FnFilter, Next, Request, Response};
///
/// fn timing<'a>(ctx: &'a mut FilterContext, req: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
///     Box::pin(async move {
///         let response = next.run(ctx, req).await;
///         tracing::debug!(elapsed_ms = ctx.elapsed().as_millis() as u64, "request finished");
///         response
///     })
/// }
///
/// let filter = FnFilter::new("timing", timing);
/// ```
pub struct FnFilter<F> {
    name: &'static str,
    func: F,
}

impl<F> FnFilter<F>
where
    F: for<'a> Fn(&'a mut FilterContext, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    /// Creates a filter that runs `func` for every request.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Filter for FnFilter<F>
where
    F: for<'a> Fn(&'a mut FilterContext, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut FilterContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        (self.func)(ctx, request, next)
    }
}

/// Continuation to the rest of the chain.
///
/// Consumed by [`Next::run`], so it can only be invoked once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Filter {
        filter: &'a dyn Filter,
        next: Box<Next<'a>>,
    },
    Handler(Handler<'a>),
}

impl<'a> Next<'a> {
    /// Creates a continuation that runs `filter` and then `next`.
    pub fn new(filter: &'a dyn Filter, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Filter {
                filter,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal continuation that invokes the handler.
    pub fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut FilterContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Builds the continuation for `filters` followed by `handler`.
    pub fn chain(filters: &'a [BoxedFilter], handler: Handler<'a>) -> Self {
        let mut next = Self {
            inner: NextInner::Handler(handler),
        };
        for filter in filters.iter().rev() {
            next = Self::new(filter.as_ref(), next);
        }
        next
    }

    /// Invokes the next filter or the handler.
    pub async fn run(self, ctx: &mut FilterContext, request: Request) -> Response {
        match self.inner {
            NextInner::Filter { filter, next } => filter.process(ctx, request, *next).await,
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;

    /// Appends its name to a `Vec<&'static str>` extension.
    struct Visit(&'static str);

    impl Filter for Visit {
        fn name(&self) -> &'static str {
            self.0
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut FilterContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                let mut visited = ctx.remove_extension::<Vec<&'static str>>().unwrap_or_default();
                visited.push(self.0);
                ctx.set_extension(visited);
                next.run(ctx, request).await
            })
        }
    }

    struct Reject;

    impl Filter for Reject {
        fn name(&self) -> &'static str {
            "reject"
        }

        fn process<'a>(
            &'a self,
            _ctx: &'a mut FilterContext,
            _request: Request,
            _next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async {
                let mut response = Response::new(Full::new(Bytes::new()));
                *response.status_mut() = StatusCode::FORBIDDEN;
                response
            })
        }
    }

    fn request() -> Request {
        http::Request::builder()
            .uri("/test")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn ok_handler<'a>() -> Handler<'a> {
        Box::new(|_ctx: &mut FilterContext, _req: Request| {
            Box::pin(async { Response::new(Full::new(Bytes::from("OK"))) }) as BoxFuture<'static, Response>
        })
    }

    #[tokio::test]
    async fn test_chain_runs_filters_in_order() {
        let filters: Vec<BoxedFilter> = vec![Arc::new(Visit("first")), Arc::new(Visit("second"))];
        let mut ctx = FilterContext::new();

        let response = Next::chain(&filters, ok_handler()).run(&mut ctx, request()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            ctx.get_extension::<Vec<&'static str>>().unwrap(),
            &vec!["first", "second"]
        );
    }

    #[tokio::test]
    async fn test_filter_can_short_circuit() {
        let filters: Vec<BoxedFilter> = vec![
            Arc::new(Visit("first")),
            Arc::new(Reject),
            Arc::new(Visit("never")),
        ];
        let mut ctx = FilterContext::new();

        let response = Next::chain(&filters, ok_handler()).run(&mut ctx, request()).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(ctx.get_extension::<Vec<&'static str>>().unwrap(), &vec!["first"]);
    }

    #[tokio::test]
    async fn test_empty_chain_calls_handler() {
        let mut ctx = FilterContext::new();
        let response = Next::chain(&[], ok_handler()).run(&mut ctx, request()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_fn_filter_wraps_closure() {
        fn tag<'a>(
            ctx: &'a mut FilterContext,
            req: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, Response> {
            Box::pin(async move {
                ctx.set_extension(vec!["closure"]);
                next.run(ctx, req).await
            })
        }

        let filters: Vec<BoxedFilter> = vec![Arc::new(FnFilter::new("tag", tag))];
        assert_eq!(filters[0].name(), "tag");

        let mut ctx = FilterContext::new();
        let response = Next::chain(&filters, ok_handler()).run(&mut ctx, request()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ctx.get_extension::<Vec<&'static str>>().unwrap(), &vec!["closure"]);
    }

    #[test]
    fn test_identify_by_concrete_type() {
        let filter: BoxedFilter = Arc::new(Reject);
        assert!(filter.is::<Reject>());
        assert!(!filter.is::<Visit>());
        assert!(filter.downcast_ref::<Reject>().is_some());
        assert_eq!(format!("{filter:?}"), "Filter(\"reject\")");
    }
}
