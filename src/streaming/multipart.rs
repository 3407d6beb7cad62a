//! `multipart/byteranges` framing (RFC 7233 appendix A)

use crate::http::ByteRange;
use std::io::{self, Write};

/// Write the delimiter and part headers that precede one range's bytes
pub fn write_part_header(
    output: &mut dyn Write,
    boundary: &str,
    content_type: &str,
    range: ByteRange,
    total: u64,
) -> io::Result<()> {
    write!(
        output,
        "\r\n--{boundary}\r\nContent-Type: {content_type}\r\nContent-Range: {}\r\n\r\n",
        range.content_range(total)
    )
}

/// Write the closing delimiter after the last part
pub fn write_closing_delimiter(output: &mut dyn Write, boundary: &str) -> io::Result<()> {
    write!(output, "\r\n--{boundary}--\r\n")
}
