//! A minimal HTTP/1.1 protocol layer over raw byte streams.
//!
//! This crate reads one request off a connection, hands it to a
//! [`Handler`](handler::Handler) and writes the response back. It knows
//! nothing about sockets, routing or files: those live in `bare-web`.
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//! use bare_http::connection::HttpConnection;
//! use bare_http::handler::{make_handler, HandlerError};
//! use bare_http::protocol::{Request, Response};
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = std::sync::Arc::new(make_handler(hello_world));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             if let Err(e) = HttpConnection::new(reader, writer).process(&handler).await {
//!                 warn!(cause = %e, "connection failed");
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: Request) -> Result<Response, HandlerError> {
//!     info!(path = request.path(), "hello");
//!     Ok(Response::text(StatusCode::OK, "Hello World!\r\n"))
//! }
//! ```
//!
//! # Modules
//!
//! - [`codec`]: line framing, request parsing, response head encoding
//! - [`protocol`]: [`Request`](protocol::Request), [`Response`](protocol::Response),
//!   [`HeaderMap`](protocol::HeaderMap), bodies and errors
//! - [`handler`]: the [`Handler`](handler::Handler) trait
//! - [`connection`]: the per-connection exchange
//!
//! # Limitations
//!
//! - one request per connection, no keep-alive
//! - no chunked transfer encoding: bodies are delimited by `content-length`
//! - maximum line size: 8KB
//! - maximum number of headers: 64

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
