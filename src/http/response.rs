//! HTTP response building module
//!
//! Builders for the fixed-status responses, decoupled from the streaming logic.

use super::body::{self, ResponseBody};
use hyper::header::{ALLOW, CONTENT_TYPE};
use hyper::{HeaderMap, Response, StatusCode};

pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Build a response from a status, a prepared header map and a body
pub fn build_response(
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Build a plain-text error response; HEAD requests get the headers only
pub fn build_error_response(
    status: StatusCode,
    mut headers: HeaderMap,
    is_head: bool,
) -> Response<ResponseBody> {
    let text = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    headers.insert(CONTENT_TYPE, hyper::header::HeaderValue::from_static("text/plain"));
    let body = if is_head { body::empty() } else { body::full(text) };
    build_response(status, headers, body)
}

/// Build 404 Not Found response
pub fn build_404_response(is_head: bool) -> Response<ResponseBody> {
    build_error_response(StatusCode::NOT_FOUND, HeaderMap::new(), is_head)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    let mut response =
        build_error_response(StatusCode::METHOD_NOT_ALLOWED, HeaderMap::new(), false);
    response
        .headers_mut()
        .insert(ALLOW, hyper::header::HeaderValue::from_static(ALLOWED_METHODS));
    response
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<ResponseBody> {
    build_error_response(StatusCode::INTERNAL_SERVER_ERROR, HeaderMap::new(), false)
}

/// Build OPTIONS response
pub fn build_options_response() -> Response<ResponseBody> {
    let mut response = build_response(StatusCode::NO_CONTENT, HeaderMap::new(), body::empty());
    response
        .headers_mut()
        .insert(ALLOW, hyper::header::HeaderValue::from_static(ALLOWED_METHODS));
    response
}

/// Build health check response
pub fn build_health_response(status: &'static str) -> Response<ResponseBody> {
    let mut response = build_response(StatusCode::OK, HeaderMap::new(), body::full(status));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, hyper::header::HeaderValue::from_static("text/plain"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_error_body() {
        let response = build_404_response(false);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"404 Not Found");
    }

    #[tokio::test]
    async fn test_head_error_has_no_body() {
        let response = build_404_response(true);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_405_allow_header() {
        let response = build_405_response();
        assert_eq!(response.headers()[ALLOW], ALLOWED_METHODS);
    }
}
