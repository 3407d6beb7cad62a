//! Response body types
//!
//! Fixed bodies use `Full`; streamed bodies are fed from a blocking writer
//! through a bounded channel so the body producer never holds the async runtime.

use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::{Body, Bytes, Frame};
use std::io::{self, Write};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

pub type ResponseBody = BoxBody<Bytes, io::Error>;

pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}

/// Body half of a streaming channel
#[derive(Debug)]
pub struct ChannelBody {
    rx: mpsc::Receiver<io::Result<Bytes>>,
}

impl Body for ChannelBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.get_mut()
            .rx
            .poll_recv(cx)
            .map(|chunk| chunk.map(|result| result.map(Frame::data)))
    }
}

/// Blocking writer half of a streaming channel
///
/// Must only be used outside the async runtime (e.g. in `spawn_blocking`).
/// Once the body is dropped, every write fails with `BrokenPipe`.
#[derive(Debug, Clone)]
pub struct ChannelWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

impl ChannelWriter {
    /// Abort the body with an error; the connection is closed instead of ending cleanly
    pub fn abort(&self, error: io::Error) {
        let _ = self.tx.blocking_send(Err(error));
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.tx
            .blocking_send(Ok(Bytes::copy_from_slice(buf)))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "client disconnected"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Create a streaming body and its writer holding at most `capacity` chunks in flight
pub fn channel(capacity: usize) -> (ChannelWriter, ChannelBody) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelWriter { tx }, ChannelBody { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_roundtrip() {
        let (mut writer, body) = channel(4);
        let producer = tokio::task::spawn_blocking(move || {
            writer.write_all(b"hello ").unwrap();
            writer.write_all(b"world").unwrap();
        });
        let collected = body.collect().await.unwrap().to_bytes();
        producer.await.unwrap();
        assert_eq!(&collected[..], b"hello world");
    }

    #[tokio::test]
    async fn test_write_after_body_dropped() {
        let (mut writer, body) = channel(1);
        drop(body);
        let err = tokio::task::spawn_blocking(move || writer.write(b"x").unwrap_err())
            .await
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
