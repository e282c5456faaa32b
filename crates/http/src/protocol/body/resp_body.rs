use std::fmt;
use std::io;

use bytes::Bytes;
use tokio::fs::File;

/// The payload of a [`Response`](crate::protocol::Response).
///
/// The length is always known up front, so `content-length` can be written
/// before the first body byte.
pub struct ResponseBody {
    inner: Kind,
}

pub(crate) enum Kind {
    Once(Bytes),
    File { file: File, length: u64 },
}

impl ResponseBody {
    pub fn empty() -> Self {
        Self { inner: Kind::Once(Bytes::new()) }
    }

    pub fn once(bytes: Bytes) -> Self {
        Self { inner: Kind::Once(bytes) }
    }

    /// Streams `length` bytes of `file` when the response is sent.
    pub fn file(file: File, length: u64) -> Self {
        Self { inner: Kind::File { file, length } }
    }

    /// Streams the whole file, taking its length from the file metadata.
    pub async fn from_file(file: File) -> io::Result<Self> {
        let length = file.metadata().await?.len();
        Ok(Self::file(file, length))
    }

    /// The number of bytes this body will write.
    pub fn length(&self) -> u64 {
        match &self.inner {
            Kind::Once(bytes) => bytes.len() as u64,
            Kind::File { length, .. } => *length,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    pub(crate) fn into_kind(self) -> Kind {
        self.inner
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Kind::Once(bytes) => f.debug_tuple("Once").field(bytes).finish(),
            Kind::File { length, .. } => f.debug_struct("File").field("length", length).finish_non_exhaustive(),
        }
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self::once(bytes)
    }
}

impl From<String> for ResponseBody {
    fn from(value: String) -> Self {
        Self::once(Bytes::from(value))
    }
}

impl From<&'static str> for ResponseBody {
    fn from(value: &'static str) -> Self {
        Self::once(Bytes::from_static(value.as_bytes()))
    }
}

impl From<&'static [u8]> for ResponseBody {
    fn from(value: &'static [u8]) -> Self {
        Self::once(Bytes::from_static(value))
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(value: Vec<u8>) -> Self {
        Self::once(Bytes::from(value))
    }
}

impl From<()> for ResponseBody {
    fn from(_: ()) -> Self {
        Self::empty()
    }
}
