//! Response building and transmission.
//!
//! A [`Response`] is assembled by a handler and consumed by
//! [`Response::send`], which writes the status line, every header value,
//! the blank separator line and finally the body. `content-length` is always
//! derived from the body, overriding whatever the handler set.

use bytes::BytesMut;
use http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::ResponseEncoder;
use crate::protocol::body::{Kind, ResponseBody};
use crate::protocol::{HeaderMap, SendError};

/// Status line and headers, without the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// A response under construction. Sending it consumes it.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: ResponseBody,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self { status, headers: HeaderMap::new(), body: ResponseBody::empty() }
    }

    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { inner: Response::new(StatusCode::OK) }
    }

    /// A `text/plain` response carrying `body`.
    pub fn text(status: StatusCode, body: impl Into<ResponseBody>) -> Self {
        Self::builder().status(status).header(http::header::CONTENT_TYPE.as_str(), mime::TEXT_PLAIN.as_ref()).body(body)
    }

    /// `100 Continue`, sent ahead of the final response.
    pub fn continue_100() -> Self {
        Self::new(StatusCode::CONTINUE)
    }

    pub fn bad_request() -> Self {
        Self::text(StatusCode::BAD_REQUEST, "Bad Request")
    }

    pub fn forbidden() -> Self {
        Self::text(StatusCode::FORBIDDEN, "Forbidden")
    }

    pub fn not_found() -> Self {
        Self::text(StatusCode::NOT_FOUND, "Not found")
    }

    pub fn method_not_allowed() -> Self {
        Self::text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    }

    pub fn internal_server_error() -> Self {
        Self::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub fn into_parts(self) -> (ResponseHead, ResponseBody) {
        (ResponseHead { status: self.status, headers: self.headers }, self.body)
    }

    /// Serializes the response onto `writer` and flushes it.
    ///
    /// File bodies are streamed with a bounded buffer. The file handle is
    /// dropped, and so closed, before this returns.
    pub async fn send<W>(self, writer: &mut W) -> Result<(), SendError>
    where
        W: AsyncWrite + Unpin,
    {
        let (head, body) = self.into_parts();
        let length = body.length();
        let status = head.status;

        let mut buf = BytesMut::new();
        ResponseEncoder::new().encode((head, length), &mut buf)?;

        match body.into_kind() {
            Kind::Once(bytes) => {
                if !status.is_informational() {
                    buf.extend_from_slice(&bytes);
                }
                writer.write_all(&buf).await?;
            }
            Kind::File { file, length } => {
                writer.write_all(&buf).await?;
                let copied = tokio::io::copy(&mut file.take(length), writer).await?;
                if copied != length {
                    return Err(SendError::invalid_body(format!("file ended after {copied} of {length} bytes")));
                }
            }
        }

        writer.flush().await?;
        trace!(status = %status, length, "sent response");
        Ok(())
    }
}

impl From<StatusCode> for Response {
    fn from(status: StatusCode) -> Self {
        Response::new(status)
    }
}

#[derive(Debug)]
pub struct ResponseBuilder {
    inner: Response,
}

impl ResponseBuilder {
    pub fn status(mut self, status: StatusCode) -> Self {
        self.inner.status = status;
        self
    }

    /// Adds a header value, keeping earlier values under the same name.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.inner.headers.add(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<ResponseBody>) -> Response {
        self.inner.body = body.into();
        self.inner
    }

    pub fn finish(self) -> Response {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{LineEnd, LineReader};
    use crate::protocol::ResponseBody;

    struct ParsedResponse {
        status_line: String,
        headers: HeaderMap,
        body: Vec<u8>,
    }

    async fn parse_response(bytes: &[u8]) -> ParsedResponse {
        let mut lines = LineReader::new(bytes);
        let status_line = lines.next_line().await.unwrap().unwrap();
        let mut headers = HeaderMap::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            let line = std::str::from_utf8(&line).unwrap();
            let (name, value) = line.split_once(':').unwrap();
            headers.add(name, value.trim_start());
        }
        assert_eq!(lines.end(), Some(LineEnd::Terminated));
        let (mut rest, buffered) = lines.into_parts();
        let mut body = buffered.to_vec();
        rest.read_to_end(&mut body).await.unwrap();
        ParsedResponse { status_line: String::from_utf8(status_line.to_vec()).unwrap(), headers, body }
    }

    #[tokio::test]
    async fn in_memory_body_round_trips() {
        let response = Response::builder().header("content-type", "text/plain").body("hi");

        let mut wire = Vec::new();
        response.send(&mut wire).await.unwrap();

        assert_eq!(wire, b"HTTP/1.1 200 OK\r\ncontent-type: text/plain\r\ncontent-length: 2\r\n\r\nhi");

        let parsed = parse_response(&wire).await;
        assert_eq!(parsed.status_line, "HTTP/1.1 200 OK");
        assert_eq!(parsed.headers.get("content-type"), Some("text/plain"));
        assert_eq!(parsed.headers.get("content-length"), Some("2"));
        assert_eq!(parsed.body, b"hi");
    }

    #[tokio::test]
    async fn multi_valued_headers_are_one_line_each() {
        let response = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Set-Cookie", "a=1")
            .header("set-cookie", "b=2")
            .header("content-length", "999")
            .finish();

        let mut wire = Vec::new();
        response.send(&mut wire).await.unwrap();

        assert_eq!(wire, b"HTTP/1.1 404 Not Found\r\nset-cookie: a=1\r\nset-cookie: b=2\r\ncontent-length: 0\r\n\r\n");
    }

    #[tokio::test]
    async fn continue_has_no_content_length() {
        let mut wire = Vec::new();
        Response::continue_100().send(&mut wire).await.unwrap();

        assert_eq!(wire, b"HTTP/1.1 100 Continue\r\n\r\n");
    }

    #[tokio::test]
    async fn file_body_is_streamed_with_its_length() {
        let path = std::env::temp_dir().join(format!("bare-http-resp-{}.txt", std::process::id()));
        tokio::fs::write(&path, b"<h1>streamed</h1>").await.unwrap();

        let file = tokio::fs::File::open(&path).await.unwrap();
        let body = ResponseBody::from_file(file).await.unwrap();
        let response = Response::builder().header("content-type", "text/html").body(body);

        let mut wire = Vec::new();
        response.send(&mut wire).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        let parsed = parse_response(&wire).await;
        assert_eq!(parsed.headers.get("content-length"), Some("17"));
        assert_eq!(parsed.body, b"<h1>streamed</h1>");
    }

    #[test]
    fn canned_responses() {
        let not_found = Response::not_found();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.headers().get("content-type"), Some("text/plain"));
        assert_eq!(not_found.body().length(), 9);

        assert_eq!(Response::bad_request().status(), StatusCode::BAD_REQUEST);
        assert_eq!(Response::forbidden().status(), StatusCode::FORBIDDEN);
        assert_eq!(Response::method_not_allowed().status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(Response::internal_server_error().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
