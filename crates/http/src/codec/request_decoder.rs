//! HTTP request decoder.
//!
//! [`RequestDecoder`] drives a [`LineReader`] over a connection to read the
//! request line and header block, and leaves the body unread: the returned
//! [`Request`] carries a [`ReqBody`](crate::protocol::body::ReqBody) that
//! starts with whatever was buffered past the blank line.
//!
//! # Accepted grammar
//!
//! - request line: exactly three tokens separated by single spaces
//!   (`METHOD SP PATH SP VERSION`); the method is upper-cased and the
//!   version is not interpreted
//! - header line: `name:value`, split at the first colon; the name is
//!   lower-cased and leading whitespace is trimmed from the value
//! - every line must be ASCII
//!
//! # Limits
//!
//! - Maximum line size: 8KB ([`MAX_LINE_BYTES`])
//! - Maximum number of headers: 64 ([`MAX_HEADER_NUM`])

use tokio::io::AsyncRead;
use tracing::trace;

use crate::codec::{LineDecoder, LineReader, MAX_LINE_BYTES};
use crate::ensure;
use crate::protocol::{HeaderMap, ParseError, Request, content_length};

/// Maximum number of header lines allowed in a request.
pub const MAX_HEADER_NUM: usize = 64;

/// Reads one request off a connection.
#[derive(Debug, Clone, Copy)]
pub struct RequestDecoder {
    max_line_bytes: usize,
    max_headers: usize,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` with the default limits.
    pub fn new() -> Self {
        Default::default()
    }

    pub fn max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    pub fn max_headers(mut self, max_headers: usize) -> Self {
        self.max_headers = max_headers;
        self
    }

    /// Parses the request line and headers from `reader`.
    ///
    /// # Errors
    ///
    /// - [`ParseError::MissingRequestLine`] if the stream ends or a blank line comes first
    /// - [`ParseError::InvalidRequestLine`] unless the first line has exactly three tokens
    /// - [`ParseError::InvalidHeader`] for a header line without a colon
    /// - [`ParseError::TooLongLine`], [`ParseError::TooManyHeaders`] past the limits
    /// - [`ParseError::Io`] if reading fails
    pub async fn decode<R>(&self, reader: R) -> Result<Request, ParseError>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let mut lines = LineReader::with_decoder(reader, LineDecoder::with_max_length(self.max_line_bytes));

        let request_line = lines.next_line().await?.ok_or(ParseError::MissingRequestLine)?;
        let (method, path) = parse_request_line(&request_line)?;

        let mut headers = HeaderMap::new();
        let mut header_count = 0;
        while let Some(line) = lines.next_line().await? {
            header_count += 1;
            ensure!(header_count <= self.max_headers, ParseError::too_many_headers(self.max_headers));

            let (name, value) = parse_header_line(&line)?;
            headers.add(name, value);
        }

        let content_length = content_length(&headers);
        trace!(method, path, header_count, content_length, "parsed request header");

        let body = lines.into_body(content_length);
        Ok(Request::builder().method(method).path(path).headers(headers).body(body).build())
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self { max_line_bytes: MAX_LINE_BYTES, max_headers: MAX_HEADER_NUM }
    }
}

/// Parses one request off `reader` with the default limits.
pub async fn parse_request<R>(reader: R) -> Result<Request, ParseError>
where
    R: AsyncRead + Send + Unpin + 'static,
{
    RequestDecoder::new().decode(reader).await
}

fn parse_request_line(line: &[u8]) -> Result<(&str, &str), ParseError> {
    let line = ascii_str(line).ok_or_else(|| ParseError::invalid_request_line(String::from_utf8_lossy(line)))?;

    let mut tokens = line.split(' ');
    match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
        (Some(method), Some(path), Some(_version), None) => Ok((method, path)),
        _ => Err(ParseError::invalid_request_line(line)),
    }
}

fn parse_header_line(line: &[u8]) -> Result<(&str, &str), ParseError> {
    let line = ascii_str(line).ok_or_else(|| ParseError::invalid_header(String::from_utf8_lossy(line)))?;

    let (name, value) = line.split_once(':').ok_or_else(|| ParseError::invalid_header(line))?;
    Ok((name, value.trim_start()))
}

fn ascii_str(bytes: &[u8]) -> Option<&str> {
    if bytes.is_ascii() { std::str::from_utf8(bytes).ok() } else { None }
}
