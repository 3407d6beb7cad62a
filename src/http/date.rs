//! HTTP-date helpers working on whole epoch seconds

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Format epoch seconds as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn format_http_date(epoch_secs: u64) -> String {
    httpdate::fmt_http_date(UNIX_EPOCH + Duration::from_secs(epoch_secs))
}

/// Format an arbitrary instant as an HTTP-date
pub fn format_system_time(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

/// Parse an HTTP-date header value into epoch seconds
///
/// Returns `None` for anything unparseable; callers treat that as an absent header.
pub fn parse_http_date(value: &str) -> Option<u64> {
    let time = httpdate::parse_http_date(value.trim()).ok()?;
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_and_parse() {
        let formatted = format_http_date(784_111_777);
        assert_eq!(formatted, "Sun, 06 Nov 1994 08:49:37 GMT");
        assert_eq!(parse_http_date(&formatted), Some(784_111_777));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_http_date("not a date"), None);
        assert_eq!(parse_http_date(""), None);
    }
}
