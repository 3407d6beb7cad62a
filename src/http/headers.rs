//! Content header builder
//!
//! Computes `Content-Type`, `Content-Length`, `Content-Range`, `Accept-Ranges`
//! and `Content-Disposition` for a response once its ranges are known.

use super::conditional::accepts;
use super::range::ByteRange;
use crate::logger;
use crate::resource::ResourceInfo;
use hyper::header::{
    HeaderName, HeaderValue, ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE,
};
use hyper::HeaderMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped in file names: RFC 3986 unreserved plus `!'()*`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'*')
    .remove(b'!')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Insert a header, logging and skipping values that are not valid header text
pub fn set_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(e) => logger::log_warning(&format!("Dropping invalid {name} header value: {e}")),
    }
}

/// Percent-encode a file name for use in `Content-Disposition`
///
/// # Examples
/// ```
/// use rangeserve::http::headers::encode_uri;
/// assert_eq!(encode_uri("my file (1).mp4"), "my%20file%20(1).mp4");
/// assert_eq!(encode_uri("ä.txt"), "%C3%A4.txt");
/// ```
pub fn encode_uri(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Whether the response should be offered as a download rather than displayed
///
/// Only `text/*` and `image/*` content is shown inline, and only when the
/// client sent no `Accept` header or one that accepts the content type.
pub fn is_attachment(accept: Option<&str>, content_type: &str) -> bool {
    let displayable = content_type.starts_with("text") || content_type.starts_with("image");
    let acceptable = accept.is_none_or(|a| accepts(a, content_type));
    !(displayable && acceptable)
}

/// `Content-Disposition` value with both a plain and an RFC 5987 file name
pub fn content_disposition(attachment: bool, file_name: &str) -> String {
    let disposition = if attachment { "attachment" } else { "inline" };
    let encoded = encode_uri(file_name);
    format!("{disposition};filename=\"{encoded}\"; filename*=UTF-8''{encoded}")
}

/// Content type as sent to the client, with a charset for text types
pub fn content_type_with_charset(content_type: &str) -> String {
    if content_type.starts_with("text") {
        format!("{content_type};charset=UTF-8")
    } else {
        content_type.to_string()
    }
}

/// Set the content headers for the final range list
///
/// `Content-Range` is only emitted for a single range of a 206 response;
/// multiple ranges switch the body to `multipart/byteranges`.
pub fn set_content_headers(
    headers: &mut HeaderMap,
    info: &ResourceInfo,
    ranges: &[ByteRange],
    partial: bool,
    accept: Option<&str>,
    boundary: &str,
) {
    let attachment = is_attachment(accept, &info.content_type);
    set_header(
        headers,
        CONTENT_DISPOSITION,
        &content_disposition(attachment, &info.file_name),
    );
    headers.insert(ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    if let [range] = ranges {
        set_header(
            headers,
            CONTENT_TYPE,
            &content_type_with_charset(&info.content_type),
        );
        headers.insert(CONTENT_LENGTH, HeaderValue::from(range.length()));
        if partial {
            set_header(headers, CONTENT_RANGE, &range.content_range(info.length));
        }
    } else {
        set_header(
            headers,
            CONTENT_TYPE,
            &format!("multipart/byteranges; boundary={boundary}"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(content_type: &str) -> ResourceInfo {
        ResourceInfo {
            id: "abc".to_string(),
            file_extension: "bin".to_string(),
            file_name: "my clip.bin".to_string(),
            length: 1000,
            last_modified: 0,
            content_type: content_type.to_string(),
            etag: "abc.bin_1000_0".to_string(),
        }
    }

    #[test]
    fn test_encode_uri() {
        assert_eq!(encode_uri("a b"), "a%20b");
        assert_eq!(encode_uri("it's~(ok)!"), "it's~(ok)!");
        assert_eq!(encode_uri("a+b\"c"), "a%2Bb%22c");
    }

    #[test]
    fn test_disposition_rules() {
        assert!(!is_attachment(None, "text/plain"));
        assert!(!is_attachment(Some("image/*"), "image/png"));
        assert!(is_attachment(Some("text/html"), "image/png"));
        assert!(is_attachment(None, "video/mp4"));
        assert!(is_attachment(Some("*/*"), "video/mp4"));
    }

    #[test]
    fn test_content_disposition_value() {
        assert_eq!(
            content_disposition(true, "my clip.mp4"),
            "attachment;filename=\"my%20clip.mp4\"; filename*=UTF-8''my%20clip.mp4"
        );
    }

    #[test]
    fn test_single_partial_range() {
        let mut headers = HeaderMap::new();
        let info = info("video/mp4");
        set_content_headers(&mut headers, &info, &[ByteRange::new(0, 99)], true, None, "B");
        assert_eq!(headers[CONTENT_TYPE], "video/mp4");
        assert_eq!(headers[CONTENT_LENGTH], "100");
        assert_eq!(headers[CONTENT_RANGE], "bytes 0-99/1000");
        assert_eq!(headers[ACCEPT_RANGES], "bytes");
        assert!(headers[CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment;"));
    }

    #[test]
    fn test_full_range_has_no_content_range() {
        let mut headers = HeaderMap::new();
        let info = info("text/plain");
        set_content_headers(&mut headers, &info, &[ByteRange::full(1000)], false, None, "B");
        assert_eq!(headers[CONTENT_TYPE], "text/plain;charset=UTF-8");
        assert_eq!(headers[CONTENT_LENGTH], "1000");
        assert!(!headers.contains_key(CONTENT_RANGE));
    }

    #[test]
    fn test_multiple_ranges() {
        let mut headers = HeaderMap::new();
        let info = info("video/mp4");
        let ranges = [ByteRange::new(0, 9), ByteRange::new(20, 29)];
        set_content_headers(&mut headers, &info, &ranges, true, None, "XYZ");
        assert_eq!(headers[CONTENT_TYPE], "multipart/byteranges; boundary=XYZ");
        assert!(!headers.contains_key(CONTENT_LENGTH));
        assert!(!headers.contains_key(CONTENT_RANGE));
    }
}
