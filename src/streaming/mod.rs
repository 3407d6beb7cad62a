//! Content streamer
//!
//! Copies the selected byte range(s) of a resource to a blocking output,
//! optionally inside `multipart/byteranges` framing and optionally gzip-encoded.
//! Source streams are owned here and dropped (closed) on every exit path.

pub mod copy;
pub mod multipart;

use crate::http::ByteRange;
use crate::logger;
use crate::store::{Resource, ResourceStore};
use copy::{copy_all, copy_exact, skip};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};

pub use copy::DEFAULT_BUFFER_SIZE;

/// Default `multipart/byteranges` boundary token
pub const DEFAULT_BOUNDARY: &str = "MULTIPART_BYTERANGES";

/// What the body of a GET response consists of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPlan {
    /// Final, non-empty range list (a full-resource range when no Range was requested)
    pub ranges: Vec<ByteRange>,
    /// Content type used inside multipart part headers
    pub content_type: String,
    pub gzip: bool,
}

/// Output wrapper that optionally gzip-encodes
enum Sink<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> Sink<W> {
    fn new(output: W, gzip: bool) -> Self {
        if gzip {
            Self::Gzip(GzEncoder::new(output, Compression::default()))
        } else {
            Self::Plain(output)
        }
    }

    /// Flush buffered data and, for gzip, write the trailer
    fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut w) => w.flush(),
            Self::Gzip(encoder) => encoder.finish()?.flush(),
        }
    }
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(w) => w.flush(),
        }
    }
}

/// Sequential reader over a resource that reopens the stream when asked to go backwards
struct RangeSource<'a> {
    store: &'a dyn ResourceStore,
    resource: &'a Resource,
    input: Option<Box<dyn Read + Send>>,
    position: u64,
}

impl<'a> RangeSource<'a> {
    const fn new(store: &'a dyn ResourceStore, resource: &'a Resource) -> Self {
        Self {
            store,
            resource,
            input: None,
            position: 0,
        }
    }

    /// Position the stream at `start` and hand it out
    fn seek_to(
        &mut self,
        start: u64,
        buffer: &mut [u8],
    ) -> io::Result<&mut (dyn Read + Send + 'static)> {
        if self.input.is_none() || start < self.position {
            let stream = self
                .store
                .open_stream(self.resource)
                .map_err(io::Error::other)?;
            self.input = Some(stream);
            self.position = 0;
        }
        let input = self
            .input
            .as_deref_mut()
            .ok_or_else(|| io::Error::other("resource stream unavailable"))?;
        skip(&mut *input, start - self.position, buffer)?;
        self.position = start;
        Ok(input)
    }

    fn copy_range(
        &mut self,
        output: &mut dyn Write,
        range: ByteRange,
        total: u64,
        buffer: &mut [u8],
    ) -> io::Result<()> {
        if range.is_full(total) {
            logger::log_debug(&format!(
                "Writing full range (bytes 0-{} = {} kB)",
                range.end,
                total / 1024
            ));
            let input = self.seek_to(0, buffer)?;
            let written = copy_all(input, output, buffer)?;
            self.position = written;
        } else {
            logger::log_debug(&format!(
                "Writing partial range (bytes {}-{} = {} kB of {} kB)",
                range.start,
                range.end,
                range.length() / 1024,
                total / 1024
            ));
            let input = self.seek_to(range.start, buffer)?;
            copy_exact(input, output, range.length(), buffer)?;
            self.position = range.end + 1;
        }
        Ok(())
    }
}

/// Writes response bodies for one resource
pub struct BodyWriter<'a> {
    store: &'a dyn ResourceStore,
    resource: &'a Resource,
    total: u64,
    buffer_size: usize,
    boundary: &'a str,
}

impl<'a> BodyWriter<'a> {
    pub fn new(
        store: &'a dyn ResourceStore,
        resource: &'a Resource,
        total: u64,
        buffer_size: usize,
        boundary: &'a str,
    ) -> Self {
        Self {
            store,
            resource,
            total,
            buffer_size: buffer_size.max(1),
            boundary,
        }
    }

    /// Stream the planned body into `output`
    ///
    /// A single range is copied as-is; several ranges are framed as multipart parts.
    pub fn write<W: Write>(&self, output: W, plan: &BodyPlan) -> io::Result<()> {
        let mut sink = Sink::new(output, plan.gzip);
        let mut source = RangeSource::new(self.store, self.resource);
        let mut buffer = vec![0u8; self.buffer_size];

        if let [range] = plan.ranges.as_slice() {
            source.copy_range(&mut sink, *range, self.total, &mut buffer)?;
        } else {
            for range in &plan.ranges {
                multipart::write_part_header(
                    &mut sink,
                    self.boundary,
                    &plan.content_type,
                    *range,
                    self.total,
                )?;
                source.copy_range(&mut sink, *range, self.total, &mut buffer)?;
            }
            multipart::write_closing_delimiter(&mut sink, self.boundary)?;
        }

        sink.finish()
    }
}

/// Whether an I/O error means the client went away mid-response
pub fn is_disconnect(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted
    )
}
