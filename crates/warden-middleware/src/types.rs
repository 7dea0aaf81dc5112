//! HTTP request and response types used by filters.

use bytes::Bytes;
use http_body_util::Full;

/// The HTTP request type flowing through filter chains.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type produced by filters and handlers.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building filter responses.
pub trait ResponseExt {
    /// Creates a plain-text response with the given status code.
    fn error(status: http::StatusCode, message: &str) -> Response;

    /// Creates a JSON error envelope: `{"error": {"code": .., "message": ..}}`.
    fn json_error(status: http::StatusCode, code: &str, message: &str) -> Response;
}

impl ResponseExt for Response {
    fn error(status: http::StatusCode, message: &str) -> Response {
        let mut response = http::Response::new(Full::new(Bytes::from(message.to_owned())));
        *response.status_mut() = status;
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }

    fn json_error(status: http::StatusCode, code: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message
            }
        });

        let mut response = http::Response::new(Full::new(Bytes::from(body.to_string())));
        *response.status_mut() = status;
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        response
    }
}
