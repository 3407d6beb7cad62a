//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation,
//! route matching, and handing stream requests to the orchestrator.

use super::stream::{respond, BodyJob, RequestHeaders, StreamRequest, StreamResponse};
use crate::config::AppState;
use crate::http;
use crate::http::body::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use crate::streaming::{self, BodyWriter};
use http_body_util::BodyExt;
use hyper::header::{HeaderName, CONTENT_LENGTH, RANGE, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{HeaderMap, Method, Request, Response, Version};
use percent_encoding::percent_decode_str;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

/// Route prefix of the streaming endpoint
pub const STREAM_PREFIX: &str = "/stream/";

/// Chunks buffered between the blocking streamer and the connection
const STREAM_CHANNEL_CAPACITY: usize = 8;

/// Main entry point for HTTP request handling
///
/// Request bodies are never read; only the request head is routed.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let (parts, _body) = req.into_parts();
    let response = route_request(&parts, &state).await;

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(
            remote_addr.to_string(),
            parts.method.to_string(),
            parts.uri.path().to_string(),
        );
        entry.http_version = version_label(parts.version).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        entry.range = header_string(&parts.headers, RANGE);
        entry.user_agent = header_string(&parts.headers, USER_AGENT);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn route_request(parts: &Parts, state: &Arc<AppState>) -> Response<ResponseBody> {
    let method = &parts.method;
    let path = parts.uri.path();

    // 1. Check HTTP method
    let is_head = match *method {
        Method::GET => false,
        Method::HEAD => true,
        Method::OPTIONS => return http::build_options_response(),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            return http::build_405_response();
        }
    };

    // 2. Log headers if enabled
    if state.config.logging.show_headers {
        for (name, value) in &parts.headers {
            logger::log_debug(&format!(
                "Header {name}: {}",
                value.to_str().unwrap_or("<binary>")
            ));
        }
    }

    // 3. Health check endpoint
    if path == state.config.routes.health_path {
        return http::build_health_response("ok");
    }

    // 4. Stream endpoint
    let Some((id, extension)) = parse_stream_path(path) else {
        logger::log_debug(&format!("No route for {path}"));
        return http::build_404_response(is_head);
    };

    let request = StreamRequest {
        id,
        extension,
        is_head,
        headers: RequestHeaders::from_headers(&parts.headers),
    };

    // Store lookups may touch the filesystem
    let store = Arc::clone(&state.store);
    let settings = state.settings.clone();
    let decision = tokio::task::spawn_blocking(move || {
        respond(store.as_ref(), &settings, &request, SystemTime::now())
    })
    .await;

    match decision {
        Ok(decision) => into_response(decision, is_head, state),
        Err(e) => {
            logger::log_error(&format!("Stream request task failed: {e}"));
            http::build_500_response()
        }
    }
}

/// Split `/stream/{id}/default.{extension}` into a decoded id and the extension
pub fn parse_stream_path(path: &str) -> Option<(String, String)> {
    let rest = path.strip_prefix(STREAM_PREFIX)?;
    let (raw_id, file) = rest.split_once('/')?;
    let extension = file.strip_prefix("default.")?;
    if raw_id.is_empty() || extension.is_empty() || extension.contains('/') {
        return None;
    }
    let id = percent_decode_str(raw_id).decode_utf8().ok()?;
    Some((id.into_owned(), extension.to_string()))
}

fn into_response(
    decision: StreamResponse,
    is_head: bool,
    state: &Arc<AppState>,
) -> Response<ResponseBody> {
    let StreamResponse {
        status,
        headers,
        body: job,
    } = decision;

    match job {
        Some(job) => http::build_response(status, headers, stream_body(state, job)),
        None if status.is_client_error() => {
            http::build_error_response(status, headers, is_head)
        }
        None => http::build_response(status, headers, body::empty()),
    }
}

/// Start the blocking streamer and return the body it feeds
fn stream_body(state: &Arc<AppState>, job: BodyJob) -> ResponseBody {
    let (writer, channel_body) = body::channel(STREAM_CHANNEL_CAPACITY);
    let store = Arc::clone(&state.store);
    let settings = state.settings.clone();

    tokio::task::spawn_blocking(move || {
        let body_writer = BodyWriter::new(
            store.as_ref(),
            &job.resource,
            job.info.length,
            settings.buffer_size,
            &settings.multipart_boundary,
        );
        if let Err(e) = body_writer.write(writer.clone(), &job.plan) {
            if streaming::is_disconnect(&e) {
                logger::log_debug(&format!(
                    "Client disconnected while streaming {}: {e}",
                    job.info.file_name
                ));
            } else {
                logger::log_warning(&format!(
                    "Streaming {} failed: {e}",
                    job.info.file_name
                ));
                writer.abort(e);
            }
        }
    });

    channel_body.boxed()
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::MemoryStore;
    use http_body_util::Empty;
    use hyper::body::Bytes;
    use hyper::header::{self, ALLOW};
    use hyper::StatusCode;
    use std::time::{Duration, UNIX_EPOCH};

    fn state() -> Arc<AppState> {
        let store = MemoryStore::new();
        let mtime = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let data: Vec<u8> = (0..5000u32).map(|i| (i % 199) as u8).collect();
        store.insert("clip", "mp4", data, mtime);
        store.insert("my clip", "mp4", vec![1u8; 10], mtime);
        let mut config = Config::load_from("nonexistent-test-config").unwrap();
        config.logging.access_log = false;
        Arc::new(AppState::new(config, Arc::new(store)))
    }

    fn request(method: Method, uri: &str) -> Request<Empty<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Empty::new())
            .unwrap()
    }

    async fn send(req: Request<Empty<Bytes>>) -> (StatusCode, hyper::HeaderMap, Bytes) {
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let response = handle_request(req, state(), addr).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, bytes)
    }

    #[test]
    fn test_parse_stream_path() {
        assert_eq!(
            parse_stream_path("/stream/abc/default.mp4"),
            Some(("abc".to_string(), "mp4".to_string()))
        );
        assert_eq!(
            parse_stream_path("/stream/my%20clip/default.mp4"),
            Some(("my clip".to_string(), "mp4".to_string()))
        );
        assert_eq!(parse_stream_path("/stream/abc/other.mp4"), None);
        assert_eq!(parse_stream_path("/stream//default.mp4"), None);
        assert_eq!(parse_stream_path("/stream/abc/default."), None);
        assert_eq!(parse_stream_path("/files/abc/default.mp4"), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_full_body() {
        let (status, headers, body) = send(request(Method::GET, "/stream/clip/default.mp4")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_LENGTH], "5000");
        assert_eq!(body.len(), 5000);
        assert_eq!(body[198], 198);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_range() {
        let mut req = request(Method::GET, "/stream/clip/default.mp4");
        req.headers_mut()
            .insert(header::RANGE, "bytes=-100".parse().unwrap());
        let (status, headers, body) = send(req).await;
        assert_eq!(status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(headers[header::CONTENT_RANGE], "bytes 4900-4999/5000");
        assert_eq!(body.len(), 100);
        assert_eq!(body[0], (4900 % 199) as u8);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_head_has_headers_without_body() {
        let (status, headers, body) = send(request(Method::HEAD, "/stream/clip/default.mp4")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_LENGTH], "5000");
        assert!(headers.contains_key(header::ETAG));
        assert!(body.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_percent_encoded_id() {
        let (status, _, body) = send(request(Method::GET, "/stream/my%20clip/default.mp4")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], &[1u8; 10]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_resource() {
        let (status, _, body) = send(request(Method::GET, "/stream/none/default.mp4")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(&body[..], b"404 Not Found");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unsatisfiable_range_body() {
        let mut req = request(Method::GET, "/stream/clip/default.mp4");
        req.headers_mut()
            .insert(header::RANGE, "bytes=9000-".parse().unwrap());
        let (status, headers, _) = send(req).await;
        assert_eq!(status, StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(headers[header::CONTENT_RANGE], "bytes */5000");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_not_modified_has_empty_body() {
        let mut req = request(Method::GET, "/stream/clip/default.mp4");
        req.headers_mut().insert(
            header::IF_NONE_MATCH,
            "\"clip.mp4_5000_1700000000\"".parse().unwrap(),
        );
        let (status, headers, body) = send(req).await;
        assert_eq!(status, StatusCode::NOT_MODIFIED);
        assert_eq!(headers[header::ETAG], "clip.mp4_5000_1700000000");
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_method_handling() {
        let (status, headers, _) = send(request(Method::POST, "/stream/clip/default.mp4")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers[ALLOW], "GET, HEAD, OPTIONS");

        let (status, _, _) = send(request(Method::OPTIONS, "/stream/clip/default.mp4")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_health_and_unknown_routes() {
        let (status, _, body) = send(request(Method::GET, "/healthz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"ok");

        let (status, _, _) = send(request(Method::GET, "/elsewhere")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
