//! Streaming request orchestrator
//!
//! Runs the GET/HEAD protocol for `/stream/{id}/default.{extension}`:
//!
//! 1. resolve the resource (404 on failure or empty resource)
//! 2. `If-Match` / `If-Unmodified-Since` (412)
//! 3. cache headers, always set from here on
//! 4. `If-None-Match` / `If-Modified-Since` (304)
//! 5. Range / `If-Range` (416 on a bad header, 206 on ranges, 200 otherwise)
//! 6. content headers and gzip negotiation
//!
//! The result is a status, a header map and, for GET, a [`BodyJob`] that the
//! caller streams. No I/O besides the store lookup happens here.

use crate::config::StreamSettings;
use crate::http::cache::{set_cache_headers, CachePolicy};
use crate::http::conditional::{accepts, not_modified, precondition_failed};
use crate::http::headers::{content_type_with_charset, set_content_headers};
use crate::http::{requested_ranges, ByteRange, RangeParseResult};
use crate::logger;
use crate::resource::ResourceInfo;
use crate::store::{Resource, ResourceStore, StoreError};
use crate::streaming::BodyPlan;
use hyper::header::{self, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use std::time::SystemTime;

/// Request headers that influence the streaming decision
#[derive(Debug, Clone, Default)]
pub struct RequestHeaders {
    pub range: Option<String>,
    pub if_range: Option<String>,
    pub if_match: Option<String>,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub if_unmodified_since: Option<String>,
    pub accept: Option<String>,
    pub accept_encoding: Option<String>,
}

impl RequestHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };
        Self {
            range: get(header::RANGE),
            if_range: get(header::IF_RANGE),
            if_match: get(header::IF_MATCH),
            if_none_match: get(header::IF_NONE_MATCH),
            if_modified_since: get(header::IF_MODIFIED_SINCE),
            if_unmodified_since: get(header::IF_UNMODIFIED_SINCE),
            accept: get(header::ACCEPT),
            accept_encoding: get(header::ACCEPT_ENCODING),
        }
    }
}

/// A GET or HEAD request for one stored resource
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub id: String,
    pub extension: String,
    pub is_head: bool,
    pub headers: RequestHeaders,
}

/// Terminal states that end the request before any body is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    NotFound,
    PreconditionFailed,
    NotModified,
    RangeNotSatisfiable,
}

impl Refusal {
    pub const fn status(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Self::NotModified => StatusCode::NOT_MODIFIED,
            Self::RangeNotSatisfiable => StatusCode::RANGE_NOT_SATISFIABLE,
        }
    }
}

/// Everything needed to stream the body of a successful GET
#[derive(Debug, Clone)]
pub struct BodyJob {
    pub resource: Resource,
    pub info: ResourceInfo,
    pub plan: BodyPlan,
}

/// Outcome of the state machine
#[derive(Debug)]
pub struct StreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Set only for GET requests that end in 200/206
    pub body: Option<BodyJob>,
}

impl StreamResponse {
    fn refused(refusal: Refusal, headers: HeaderMap) -> Self {
        Self {
            status: refusal.status(),
            headers,
            body: None,
        }
    }
}

/// Decide status, headers and body for a stream request
pub fn respond(
    store: &dyn ResourceStore,
    settings: &StreamSettings,
    request: &StreamRequest,
    now: SystemTime,
) -> StreamResponse {
    let id = request.id.as_str();
    let extension = request.extension.as_str();
    let req = &request.headers;
    let mut headers = HeaderMap::new();

    let resource = match store.find(id, extension) {
        Ok(r) => r,
        Err(e) => {
            let reason = match &e {
                StoreError::NotFound { .. } => "not found".to_string(),
                StoreError::Io { .. } => format!("lookup failed ({e})"),
            };
            logger::log_decision(404, id, extension, &reason);
            return StreamResponse::refused(Refusal::NotFound, headers);
        }
    };

    let info = ResourceInfo::new(id, &resource);
    logger::log_debug(&format!("ETag for requested resource = {}", info.etag));
    if info.length == 0 {
        logger::log_decision(404, id, extension, "resource has no content");
        return StreamResponse::refused(Refusal::NotFound, headers);
    }

    if precondition_failed(
        req.if_match.as_deref(),
        req.if_unmodified_since.as_deref(),
        &info,
    ) {
        logger::log_decision(412, id, extension, "If-Match/If-Unmodified-Since failed");
        return StreamResponse::refused(Refusal::PreconditionFailed, headers);
    }

    let policy = CachePolicy::from_expires(settings.expires_secs);
    set_cache_headers(&mut headers, policy, &info, now);

    if not_modified(
        req.if_none_match.as_deref(),
        req.if_modified_since.as_deref(),
        &info,
    ) {
        logger::log_decision(304, id, extension, "not modified");
        return StreamResponse::refused(Refusal::NotModified, headers);
    }

    let requested = requested_ranges(req.range.as_deref(), req.if_range.as_deref(), &info);
    let (status, ranges) = match requested {
        RangeParseResult::Invalid => {
            if let Ok(v) = HeaderValue::from_str(&format!("bytes */{}", info.length)) {
                headers.insert(header::CONTENT_RANGE, v);
            }
            logger::log_decision(416, id, extension, "Range header not satisfiable");
            return StreamResponse::refused(Refusal::RangeNotSatisfiable, headers);
        }
        RangeParseResult::None => (StatusCode::OK, vec![ByteRange::full(info.length)]),
        RangeParseResult::Ranges(ranges) => (StatusCode::PARTIAL_CONTENT, ranges),
    };

    set_content_headers(
        &mut headers,
        &info,
        &ranges,
        status == StatusCode::PARTIAL_CONTENT,
        req.accept.as_deref(),
        &settings.multipart_boundary,
    );

    let gzip = info.content_type.starts_with("text")
        && req
            .accept_encoding
            .as_deref()
            .is_some_and(|ae| accepts(ae, "gzip"));
    if gzip {
        // The encoded length is unknown up front; the body goes out chunked
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        headers.remove(header::CONTENT_LENGTH);
    }

    if request.is_head {
        return StreamResponse {
            status,
            headers,
            body: None,
        };
    }

    let plan = BodyPlan {
        ranges,
        content_type: content_type_with_charset(&info.content_type),
        gzip,
    };
    StreamResponse {
        status,
        headers,
        body: Some(BodyJob {
            resource,
            info,
            plan,
        }),
    }
}
