//! Conditional request evaluation (RFC 7232)
//!
//! Validators are compared against the metadata-derived `ETag` and the
//! second-granularity last-modified time of the resource.

use super::date::parse_http_date;
use crate::resource::ResourceInfo;

/// Returns true if any comma-separated token of `match_header` equals `to_match`
///
/// `*` matches everything. A token wrapped in double quotes is compared by its
/// inner value, so `"abc"` and `abc` both match the tag `abc`, and `"*"` is
/// still the wildcard.
pub fn matches(match_header: &str, to_match: &str) -> bool {
    match_header.split(',').map(str::trim).any(|token| {
        let tag = token
            .strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(token);
        tag == "*" || tag == to_match
    })
}

/// Returns true if an `Accept`-style header accepts `to_accept`
///
/// Tokens are split on `,` and `;`. Besides an exact match, `type/*`, `*/*`
/// and a bare `*` are honoured.
///
/// # Examples
/// ```
/// use rangeserve::http::conditional::accepts;
/// assert!(accepts("text/html, image/*;q=0.8", "image/png"));
/// assert!(accepts("gzip, deflate", "gzip"));
/// assert!(!accepts("br", "gzip"));
/// ```
pub fn accepts(accept_header: &str, to_accept: &str) -> bool {
    let wildcard_subtype = to_accept
        .split_once('/')
        .map(|(main, _)| format!("{main}/*"));

    accept_header
        .split([',', ';'])
        .map(str::trim)
        .any(|token| {
            token == to_accept
                || token == "*/*"
                || token == "*"
                || wildcard_subtype.as_deref() == Some(token)
        })
}

/// Returns true if `last_modified` is newer than the header date by at least one second
#[inline]
pub const fn modified(header_secs: u64, last_modified: u64) -> bool {
    header_secs.saturating_add(1) <= last_modified
}

/// `If-Match` / `If-Unmodified-Since` evaluation
///
/// When `If-Match` is present it alone decides; otherwise a parseable
/// `If-Unmodified-Since` older than the resource fails the request.
pub fn precondition_failed(
    if_match: Option<&str>,
    if_unmodified_since: Option<&str>,
    info: &ResourceInfo,
) -> bool {
    match if_match {
        Some(header) => !matches(header, &info.etag),
        None => if_unmodified_since
            .and_then(parse_http_date)
            .is_some_and(|since| modified(since, info.last_modified)),
    }
}

/// `If-None-Match` / `If-Modified-Since` evaluation
///
/// `If-Modified-Since` is only consulted when no `If-None-Match` is sent.
pub fn not_modified(
    if_none_match: Option<&str>,
    if_modified_since: Option<&str>,
    info: &ResourceInfo,
) -> bool {
    match if_none_match {
        Some(header) => matches(header, &info.etag),
        None => if_modified_since
            .and_then(parse_http_date)
            .is_some_and(|since| !modified(since, info.last_modified)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::date::format_http_date;

    const LAST_MODIFIED: u64 = 1_700_000_000;

    fn info() -> ResourceInfo {
        ResourceInfo {
            id: "abc".to_string(),
            file_extension: "mp4".to_string(),
            file_name: "abc.mp4".to_string(),
            length: 10_000,
            last_modified: LAST_MODIFIED,
            content_type: "video/mp4".to_string(),
            etag: "abc.mp4_10000_1700000000".to_string(),
        }
    }

    #[test]
    fn test_matches() {
        assert!(matches("abc", "abc"));
        assert!(matches("x, abc", "abc"));
        assert!(matches("\"abc\"", "abc"));
        assert!(matches("*", "abc"));
        assert!(!matches("ABC", "abc"));
        assert!(!matches("abcd", "abc"));
    }

    #[test]
    fn test_accepts() {
        assert!(accepts("video/mp4", "video/mp4"));
        assert!(accepts("video/*", "video/mp4"));
        assert!(accepts("*/*", "video/mp4"));
        assert!(accepts("text/html;q=0.9, application/xml", "application/xml"));
        assert!(!accepts("text/html", "video/mp4"));
        assert!(accepts("gzip;q=1.0, identity", "gzip"));
        assert!(!accepts("deflate", "gzip"));
    }

    #[test]
    fn test_modified_tolerance() {
        assert!(!modified(LAST_MODIFIED, LAST_MODIFIED));
        assert!(modified(LAST_MODIFIED - 1, LAST_MODIFIED));
        assert!(!modified(LAST_MODIFIED + 5, LAST_MODIFIED));
    }

    #[test]
    fn test_if_match() {
        let info = info();
        assert!(!precondition_failed(Some("*"), None, &info));
        assert!(!precondition_failed(Some("\"*\""), None, &info));
        assert!(!precondition_failed(Some(&info.etag), None, &info));
        assert!(precondition_failed(Some("other"), None, &info));
    }

    #[test]
    fn test_if_unmodified_since() {
        let info = info();
        let older = format_http_date(LAST_MODIFIED - 60);
        let same = format_http_date(LAST_MODIFIED);
        assert!(precondition_failed(None, Some(&older), &info));
        assert!(!precondition_failed(None, Some(&same), &info));
        assert!(!precondition_failed(None, Some("garbage"), &info));
        assert!(!precondition_failed(None, None, &info));
    }

    #[test]
    fn test_if_none_match() {
        let info = info();
        assert!(not_modified(Some(&info.etag), None, &info));
        assert!(not_modified(Some("*"), None, &info));
        assert!(!not_modified(Some("stale"), None, &info));
    }

    #[test]
    fn test_if_none_match_takes_precedence() {
        let info = info();
        let same = format_http_date(LAST_MODIFIED);
        assert!(!not_modified(Some("stale"), Some(&same), &info));
    }

    #[test]
    fn test_if_modified_since() {
        let info = info();
        let same = format_http_date(LAST_MODIFIED);
        let older = format_http_date(LAST_MODIFIED - 3600);
        assert!(not_modified(None, Some(&same), &info));
        assert!(!not_modified(None, Some(&older), &info));
        assert!(!not_modified(None, Some("garbage"), &info));
    }
}
