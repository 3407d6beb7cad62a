//! HTTP Range request parsing module
//!
//! Range header parsing for resumable downloads and media seeking, compliant with
//! RFC 7233. Multiple comma-separated byte ranges are supported.

use super::conditional::modified;
use super::date::parse_http_date;
use crate::resource::ResourceInfo;

/// Closed byte interval `[start, end]`, zero-based and inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    #[inline]
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Range covering a whole resource of `length` bytes (`length` must be > 0)
    #[inline]
    pub const fn full(length: u64) -> Self {
        Self::new(0, length - 1)
    }

    /// Number of bytes in the interval
    #[inline]
    pub const fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    #[inline]
    pub const fn is_full(&self, total: u64) -> bool {
        self.start == 0 && self.length() == total
    }

    /// `Content-Range` value, e.g. `bytes 0-499/10000`
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{total}", self.start, self.end)
    }
}

/// Range header parse result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeParseResult {
    /// No usable Range header: serve the full resource
    None,
    /// Malformed or logically impossible Range header: 416
    Invalid,
    /// One or more satisfiable ranges
    Ranges(Vec<ByteRange>),
}

/// Parse a `Range` header against a resource of `length` bytes
///
/// The header must match `bytes=<spec>(,<spec>)*` with each range being
/// `digits?-digits?`, without whitespace. A single range with `start > end`
/// after clamping invalidates the whole header.
///
/// # Examples
/// ```
/// use rangeserve::http::range::{parse_range_header, ByteRange, RangeParseResult};
///
/// let result = parse_range_header(Some("bytes=-500"), 10_000);
/// assert_eq!(result, RangeParseResult::Ranges(vec![ByteRange::new(9500, 9999)]));
///
/// assert_eq!(parse_range_header(None, 10_000), RangeParseResult::None);
/// assert_eq!(parse_range_header(Some("bytes=500-200"), 10_000), RangeParseResult::Invalid);
/// ```
pub fn parse_range_header(range_header: Option<&str>, length: u64) -> RangeParseResult {
    let Some(header) = range_header else {
        return RangeParseResult::None;
    };
    let Some(specs) = split_specs(header) else {
        return RangeParseResult::Invalid;
    };

    let mut ranges = Vec::with_capacity(specs.len());
    for (start, end) in specs {
        match resolve_spec(start, end, length) {
            Some(range) => ranges.push(range),
            None => return RangeParseResult::Invalid,
        }
    }
    RangeParseResult::Ranges(ranges)
}

/// Parse the Range header of a request, honouring `If-Range`
///
/// A syntactically broken Range header is always invalid. When `If-Range` is
/// present and neither equals the current `ETag` nor is a date at least as new
/// as the resource, the Range header is ignored and the full resource is served.
pub fn requested_ranges(
    range_header: Option<&str>,
    if_range: Option<&str>,
    info: &ResourceInfo,
) -> RangeParseResult {
    let Some(header) = range_header else {
        return RangeParseResult::None;
    };
    if split_specs(header).is_none() {
        return RangeParseResult::Invalid;
    }
    if let Some(if_range) = if_range {
        if !if_range_allows(if_range.trim(), info) {
            return RangeParseResult::None;
        }
    }
    parse_range_header(Some(header), info.length)
}

fn if_range_allows(if_range: &str, info: &ResourceInfo) -> bool {
    let tag = if_range
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(if_range);
    if tag == info.etag {
        return true;
    }
    // Not our tag: only an HTTP-date that is not older than the resource keeps the ranges
    parse_http_date(if_range).is_some_and(|date| !modified(date, info.last_modified))
}

/// Split `bytes=a-b,c-d` into raw `(start, end)` digit strings
fn split_specs(header: &str) -> Option<Vec<(&str, &str)>> {
    let body = header.strip_prefix("bytes=")?;
    body.split(',')
        .map(|spec| {
            let (start, end) = spec.split_once('-')?;
            let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
            (digits(start) && digits(end)).then_some((start, end))
        })
        .collect()
}

/// Turn one raw range into a clamped interval, `None` on a logic error
fn resolve_spec(start: &str, end: &str, length: u64) -> Option<ByteRange> {
    if length == 0 {
        return None;
    }
    let last = length - 1;

    let (start, end) = if start.is_empty() {
        // Suffix range: the final `end` bytes
        let suffix: u64 = end.parse().ok()?;
        if suffix == 0 {
            return None;
        }
        (length.saturating_sub(suffix), last)
    } else {
        let start: u64 = start.parse().ok()?;
        let end = if end.is_empty() {
            last
        } else {
            end.parse::<u64>().ok()?.min(last)
        };
        (start, end)
    };

    (start <= end).then(|| ByteRange::new(start, end))
}
