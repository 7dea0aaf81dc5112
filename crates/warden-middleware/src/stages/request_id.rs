//! Request id filter.
//!
//! Assigns every request a [`RequestId`] so log lines emitted by later
//! filters and by the handler can be correlated. An incoming `x-request-id`
//! header is reused when the filter trusts it and it holds a valid UUID;
//! otherwise a fresh UUID v7 is generated. The id is always echoed back on
//! the response.

use http::HeaderValue;
use uuid::Uuid;
use warden_core::RequestId;

use crate::context::FilterContext;
use crate::filter::{BoxFuture, Filter, Next};
use crate::types::{Request, Response};

/// The header name for request id propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Filter that generates or propagates request ids.
///
/// # Example
///
/// ```
/// use warden_middleware::stages::RequestIdFilter;
/// use warden_middleware::Filter;
///
/// let filter = RequestIdFilter::trust_incoming();
/// assert_eq!(filter.name(), "request_id");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestIdFilter {
    trust_incoming: bool,
}

impl RequestIdFilter {
    /// Creates a filter that always generates a new id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter that reuses a valid incoming `x-request-id`.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    fn extract_request_id(&self, request: &Request) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }

        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(RequestId::from_uuid)
    }
}

impl Filter for RequestIdFilter {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut FilterContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let request_id = self
                .extract_request_id(&request)
                .unwrap_or_else(RequestId::new);
            ctx.set_request_id(request_id);

            let mut response = next.run(ctx, request).await;

            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{Request as HttpRequest, StatusCode};
    use http_body_util::Full;

    fn create_request(request_id: Option<&str>) -> Request {
        let mut builder = HttpRequest::builder().uri("/test");
        if let Some(id) = request_id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    fn create_handler() -> impl FnOnce(&mut FilterContext, Request) -> BoxFuture<'static, Response> {
        |_ctx, _req| Box::pin(async { Response::new(Full::new(Bytes::from("OK"))) })
    }

    async fn run(filter: &RequestIdFilter, ctx: &mut FilterContext, request: Request) -> Response {
        filter
            .process(ctx, request, Next::handler(create_handler()))
            .await
    }

    #[tokio::test]
    async fn test_generates_request_id_when_missing() {
        let filter = RequestIdFilter::trust_incoming();
        let mut ctx = FilterContext::new();

        let response = run(&filter, &mut ctx, create_request(None)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let header_id = response.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        assert_eq!(ctx.request_id().to_string(), header_id);
    }

    #[tokio::test]
    async fn test_propagates_valid_incoming_id() {
        let filter = RequestIdFilter::trust_incoming();
        let mut ctx = FilterContext::new();
        let incoming = "01234567-89ab-7def-8123-456789abcdef";

        let response = run(&filter, &mut ctx, create_request(Some(incoming))).await;

        assert_eq!(response.headers().get(REQUEST_ID_HEADER).unwrap(), incoming);
        assert_eq!(ctx.request_id().to_string(), incoming);
    }

    #[tokio::test]
    async fn test_replaces_invalid_incoming_id() {
        let filter = RequestIdFilter::trust_incoming();
        let mut ctx = FilterContext::new();

        let response = run(&filter, &mut ctx, create_request(Some("not-a-uuid"))).await;

        let header_id = response.headers().get(REQUEST_ID_HEADER).unwrap().to_str().unwrap();
        assert_ne!(header_id, "not-a-uuid");
        assert!(Uuid::parse_str(header_id).is_ok());
    }

    #[tokio::test]
    async fn test_untrusting_filter_ignores_incoming_id() {
        let filter = RequestIdFilter::new();
        let mut ctx = FilterContext::new();
        let incoming = "01234567-89ab-7def-8123-456789abcdef";

        let response = run(&filter, &mut ctx, create_request(Some(incoming))).await;

        assert_ne!(response.headers().get(REQUEST_ID_HEADER).unwrap(), incoming);
    }
}
