//! MIME type detection module
//!
//! Maps a file extension to its bare content type. Charset parameters are added
//! later by the header builder, so none of the values here carry one.

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Get MIME Content-Type based on file extension (case-insensitive)
///
/// # Examples
/// ```
/// use rangeserve::http::mime::get_content_type;
/// assert_eq!(get_content_type(Some("MP4")), "video/mp4");
/// assert_eq!(get_content_type(Some("txt")), "text/plain");
/// assert_eq!(get_content_type(None), "application/octet-stream");
/// ```
pub fn get_content_type(extension: Option<&str>) -> &'static str {
    let Some(ext) = extension else {
        return DEFAULT_CONTENT_TYPE;
    };
    match ext.to_ascii_lowercase().as_str() {
        // Text
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "txt" | "text" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "vtt" => "text/vtt",
        "srt" => "application/x-subrip",
        "xml" => "application/xml",
        "json" => "application/json",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "jp2" => "image/jp2",
        "bmp" => "image/bmp",

        // Video
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "mpg" | "mpeg" => "video/mpeg",

        // Audio
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "opus" => "audio/opus",

        // Documents
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "epub" => "application/epub+zip",

        _ => DEFAULT_CONTENT_TYPE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_types() {
        assert_eq!(get_content_type(Some("mp4")), "video/mp4");
        assert_eq!(get_content_type(Some("mp3")), "audio/mpeg");
        assert_eq!(get_content_type(Some("jpg")), "image/jpeg");
        assert_eq!(get_content_type(Some("txt")), "text/plain");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(get_content_type(Some("PNG")), "image/png");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(get_content_type(Some("xyz")), DEFAULT_CONTENT_TYPE);
        assert_eq!(get_content_type(None), DEFAULT_CONTENT_TYPE);
    }
}
