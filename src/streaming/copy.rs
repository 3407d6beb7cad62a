//! Bounded-buffer byte copying between blocking streams

use std::io::{self, Read, Write};

/// Default copy buffer size (10 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 10 * 1024;

/// Copy everything until end of input, returning the number of bytes written
pub fn copy_all(
    input: &mut dyn Read,
    output: &mut dyn Write,
    buffer: &mut [u8],
) -> io::Result<u64> {
    let mut written = 0u64;
    loop {
        let read = match input.read(buffer) {
            Ok(0) => return Ok(written),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        output.write_all(&buffer[..read])?;
        written += read as u64;
    }
}

/// Copy exactly `length` bytes; running out of input is an error
pub fn copy_exact(
    input: &mut dyn Read,
    output: &mut dyn Write,
    length: u64,
    buffer: &mut [u8],
) -> io::Result<()> {
    let mut remaining = length;
    while remaining > 0 {
        let want = usize::try_from(remaining).map_or(buffer.len(), |r| r.min(buffer.len()));
        let read = match input.read(&mut buffer[..want]) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("source ended {remaining} bytes before the end of the range"),
                ))
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        output.write_all(&buffer[..read])?;
        remaining -= read as u64;
    }
    Ok(())
}

/// Read and discard `count` bytes
pub fn skip(input: &mut dyn Read, count: u64, buffer: &mut [u8]) -> io::Result<()> {
    copy_exact(input, &mut io::sink(), count, buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_copy_all_small_buffer() {
        let mut input = Cursor::new(b"abcdefghij".to_vec());
        let mut out = Vec::new();
        let n = copy_all(&mut input, &mut out, &mut [0u8; 3]).unwrap();
        assert_eq!(n, 10);
        assert_eq!(out, b"abcdefghij");
    }

    #[test]
    fn test_skip_then_copy_exact() {
        let mut input = Cursor::new(b"abcdefghij".to_vec());
        let mut out = Vec::new();
        let mut buf = [0u8; 4];
        skip(&mut input, 3, &mut buf).unwrap();
        copy_exact(&mut input, &mut out, 5, &mut buf).unwrap();
        assert_eq!(out, b"defgh");
    }

    #[test]
    fn test_copy_exact_short_input() {
        let mut input = Cursor::new(b"abc".to_vec());
        let err = copy_exact(&mut input, &mut Vec::new(), 5, &mut [0u8; 8]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
