//! Response head serialization.
//!
//! [`ResponseEncoder`] writes the status line and header block of a response
//! into a buffer. The body is not its concern: the caller passes the body
//! length alongside the head and writes the body bytes itself.

use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use http::header;
use tokio_util::codec::Encoder;

use crate::protocol::{ResponseHead, SendError};

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encodes a [`ResponseHead`] and its body length.
///
/// `content-length` is replaced with the real body length, in place when
/// the handler already set it. Informational (1xx) responses never carry
/// a body, so any `content-length` is dropped from them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<(ResponseHead, u64)> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, item: (ResponseHead, u64), dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (ResponseHead { status, mut headers }, length) = item;

        dst.reserve(INIT_HEADER_SIZE);
        write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", status.as_str(), status.canonical_reason().unwrap_or(""))?;

        if status.is_informational() {
            headers.remove(header::CONTENT_LENGTH.as_str());
        } else {
            headers.set(header::CONTENT_LENGTH.as_str(), length.to_string());
        }

        for (name, value) in headers.iter() {
            dst.put_slice(name.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(value.as_bytes());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Adapts a `BytesMut` to `io::Write` so `write!` can format into it.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::HeaderMap;
    use http::StatusCode;

    fn encode(status: StatusCode, headers: HeaderMap, length: u64) -> String {
        let mut buf = BytesMut::new();
        ResponseEncoder::new().encode((ResponseHead { status, headers }, length), &mut buf).unwrap();
        String::from_utf8(buf.to_vec()).unwrap()
    }

    #[test]
    fn writes_status_line_and_length() {
        let headers = [("Content-Type", "text/html")].into_iter().collect();
        assert_eq!(
            encode(StatusCode::OK, headers, 12),
            "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ncontent-length: 12\r\n\r\n"
        );
    }

    #[test]
    fn handler_length_is_overridden_in_place() {
        let headers = [("content-length", "1"), ("x-a", "b")].into_iter().collect();
        assert_eq!(
            encode(StatusCode::FORBIDDEN, headers, 9),
            "HTTP/1.1 403 Forbidden\r\ncontent-length: 9\r\nx-a: b\r\n\r\n"
        );
    }

    #[test]
    fn informational_drops_content_length() {
        let headers = [("content-length", "5")].into_iter().collect();
        assert_eq!(encode(StatusCode::CONTINUE, headers, 0), "HTTP/1.1 100 Continue\r\n\r\n");
    }

    #[test]
    fn unknown_status_has_empty_reason() {
        let status = StatusCode::from_u16(599).unwrap();
        assert_eq!(encode(status, HeaderMap::new(), 0), "HTTP/1.1 599 \r\ncontent-length: 0\r\n\r\n");
    }
}
