use std::fmt;
use std::io;
use std::io::Cursor;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, Chain, Take};
use tokio::sync::Mutex;
use tracing::trace;

use crate::protocol::ParseError;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BodyReader = Take<Chain<Cursor<BytesMut>, BoxedReader>>;

/// Initial capacity ceiling when collecting a body into memory.
const MAX_PREALLOCATE: u64 = 64 * 1024;

/// Handle to the bytes of a request body that nobody has read yet.
///
/// Cloning is cheap and every clone reads from the same position: the
/// connection keeps one clone so it can skip whatever the handler left
/// unread before the socket is closed.
#[derive(Clone)]
pub struct ReqBody {
    inner: Arc<Mutex<BodyReader>>,
    content_length: u64,
}

impl ReqBody {
    /// Builds a body from bytes already buffered past the header block,
    /// followed by the rest of the stream, limited to `content_length` bytes.
    pub fn new<R>(buffered: BytesMut, reader: R, content_length: u64) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let reader: BoxedReader = Box::new(reader);
        let inner = Cursor::new(buffered).chain(reader).take(content_length);
        Self { inner: Arc::new(Mutex::new(inner)), content_length }
    }

    /// A body with no bytes at all.
    pub fn empty() -> Self {
        Self::new(BytesMut::new(), tokio::io::empty(), 0)
    }

    /// A body backed by an in-memory buffer, mostly useful in tests.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes: Bytes = bytes.into();
        let length = bytes.len() as u64;
        Self::new(BytesMut::from(&bytes[..]), tokio::io::empty(), length)
    }

    /// The length the client declared in `content-length`.
    #[inline]
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Reads the next chunk into `buf`, returning 0 once the declared
    /// length has been consumed or the peer closed the stream.
    pub async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock().await;
        guard.read(buf).await
    }

    /// Collects the rest of the body into memory.
    ///
    /// Fails with an `UnexpectedEof` I/O error when the peer closes the
    /// stream before the declared length arrived.
    pub async fn bytes(&self) -> Result<Bytes, ParseError> {
        let mut guard = self.inner.lock().await;
        let mut buf = Vec::with_capacity(guard.limit().min(MAX_PREALLOCATE) as usize);
        guard.read_to_end(&mut buf).await?;

        if guard.limit() > 0 {
            return Err(ParseError::io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("body ended {} bytes before content-length", guard.limit()),
            )));
        }

        Ok(Bytes::from(buf))
    }

    /// Reads and discards up to `max` unread bytes, returning how many were dropped.
    pub async fn skip(&self, max: u64) -> io::Result<u64> {
        let mut guard = self.inner.lock().await;
        let remaining = guard.limit();
        if remaining == 0 {
            return Ok(0);
        }

        let skipped = tokio::io::copy(&mut (&mut *guard).take(max), &mut tokio::io::sink()).await?;
        trace!(skipped, remaining, "skipped unread request body");
        Ok(skipped)
    }
}

impl Default for ReqBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ReqBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqBody").field("content_length", &self.content_length).finish_non_exhaustive()
    }
}
