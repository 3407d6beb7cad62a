//! HTTP cache control module
//!
//! Emits the headers that let browsers and intermediaries cache streamed
//! resources and revalidate them against `ETag` / `Last-Modified`.

use super::date::{format_http_date, format_system_time};
use super::headers::set_header;
use crate::resource::ResourceInfo;
use hyper::header::{CACHE_CONTROL, ETAG, EXPIRES, LAST_MODIFIED, PRAGMA};
use hyper::HeaderMap;
use std::time::{Duration, SystemTime};

/// Default client cache lifetime: 30 days
pub const DEFAULT_EXPIRES_SECS: u64 = 30 * 24 * 60 * 60;

/// Cache control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Public cache with specified max-age (seconds), revalidated on expiry
    Public(u64),
    /// Neither cache nor store
    NoCache,
}

impl CachePolicy {
    /// A zero expiry disables caching
    pub const fn from_expires(expires_secs: u64) -> Self {
        if expires_secs > 0 {
            Self::Public(expires_secs)
        } else {
            Self::NoCache
        }
    }

    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::Public(max_age) => format!("public,max-age={max_age},must-revalidate"),
            Self::NoCache => "no-cache,no-store,must-revalidate".to_string(),
        }
    }

    /// Set `Cache-Control`, `Expires` and `Pragma`
    ///
    /// The public policy sends an empty `Pragma` so nothing downstream adds `no-cache`.
    pub fn apply(self, headers: &mut HeaderMap, now: SystemTime) {
        set_header(headers, CACHE_CONTROL, &self.to_header_value());
        match self {
            Self::Public(max_age) => {
                let expires = now + Duration::from_secs(max_age);
                set_header(headers, EXPIRES, &format_system_time(expires));
                set_header(headers, PRAGMA, "");
            }
            Self::NoCache => {
                set_header(headers, EXPIRES, "0");
                set_header(headers, PRAGMA, "no-cache");
            }
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::Public(DEFAULT_EXPIRES_SECS)
    }
}

/// Set the cache policy headers plus the resource validators
pub fn set_cache_headers(
    headers: &mut HeaderMap,
    policy: CachePolicy,
    info: &ResourceInfo,
    now: SystemTime,
) {
    policy.apply(headers, now);
    set_header(headers, ETAG, &info.etag);
    set_header(headers, LAST_MODIFIED, &format_http_date(info.last_modified));
}
