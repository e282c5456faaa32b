//! Pull-based sequence of header lines read off a connection.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use crate::codec::LineDecoder;
use crate::protocol::ParseError;
use crate::protocol::body::ReqBody;

/// Initial capacity of the shared read buffer.
const INIT_BUFFER_SIZE: usize = 8 * 1024;

/// How a [`LineReader`] sequence finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    /// A blank line was read; bytes after it are the remainder.
    Terminated,
    /// The peer closed the stream (or a line failed to decode) first; there is no remainder.
    Exhausted,
}

/// Lazily yields CRLF-delimited lines until the first blank line.
///
/// Bytes are only requested from the reader when no full line is buffered.
/// Once the sequence has ended, [`end`](Self::end) tells a blank line apart
/// from end-of-stream, and [`into_parts`](Self::into_parts) hands back the
/// reader together with whatever was read past the blank line.
#[derive(Debug)]
pub struct LineReader<R> {
    framed: FramedRead<R, LineDecoder>,
    end: Option<LineEnd>,
}

impl<R> LineReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self::with_decoder(reader, LineDecoder::new())
    }

    pub fn with_decoder(reader: R, decoder: LineDecoder) -> Self {
        Self { framed: FramedRead::with_capacity(reader, decoder, INIT_BUFFER_SIZE), end: None }
    }

    /// Returns the next non-blank line, or `None` once the sequence is over.
    ///
    /// After `None` (or an error) every further call returns `Ok(None)`.
    pub async fn next_line(&mut self) -> Result<Option<Bytes>, ParseError> {
        if self.end.is_some() {
            return Ok(None);
        }

        match self.framed.next().await {
            Some(Ok(line)) if line.is_empty() => {
                self.end = Some(LineEnd::Terminated);
                Ok(None)
            }
            Some(Ok(line)) => Ok(Some(line)),
            Some(Err(e)) => {
                self.end = Some(LineEnd::Exhausted);
                Err(e)
            }
            None => {
                self.end = Some(LineEnd::Exhausted);
                Ok(None)
            }
        }
    }

    /// `None` while lines may still follow.
    pub fn end(&self) -> Option<LineEnd> {
        self.end
    }

    /// The underlying reader and the bytes buffered but not yet consumed as lines.
    pub fn into_parts(self) -> (R, BytesMut) {
        let parts = self.framed.into_parts();
        (parts.io, parts.read_buf)
    }

    /// Turns the remainder into a request body of `content_length` bytes.
    ///
    /// A sequence that ran out of input has no remainder, so the body is empty.
    pub fn into_body(self, content_length: u64) -> ReqBody
    where
        R: Send + 'static,
    {
        match self.end {
            Some(LineEnd::Terminated) => {
                let (reader, buffered) = self.into_parts();
                ReqBody::new(buffered, reader, content_length)
            }
            _ => ReqBody::empty(),
        }
    }
}
