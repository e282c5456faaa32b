//! Wire-level reading and writing.
//!
//! - Request side:
//!   - [`LineDecoder`]: a [`Decoder`](tokio_util::codec::Decoder) that frames CRLF lines
//!   - [`LineReader`]: pulls lines off a connection until the blank line
//!   - [`RequestDecoder`] / [`parse_request`]: request line and header block
//!     into a [`Request`](crate::protocol::Request)
//!
//! - Response side:
//!   - [`ResponseEncoder`]: an [`Encoder`](tokio_util::codec::Encoder) for the
//!     status line and headers
//!
//! # Example
//!
//! ```no_run
//! use bare_http::codec::parse_request;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let request = parse_request(&b"GET /index.html HTTP/1.1\r\nhost: a\r\n\r\n"[..]).await?;
//! assert_eq!(request.path(), "/index.html");
//! # Ok(())
//! # }
//! ```

mod line_decoder;
mod line_reader;
mod request_decoder;
mod response_encoder;

pub use line_decoder::{LineDecoder, MAX_LINE_BYTES};
pub use line_reader::{LineEnd, LineReader};
pub use request_decoder::{MAX_HEADER_NUM, RequestDecoder, parse_request};
pub use response_encoder::ResponseEncoder;
