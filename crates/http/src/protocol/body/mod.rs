//! Request and response bodies.
//!
//! - [`ReqBody`]: the unread remainder of a request, capped at the declared
//!   `content-length`. It starts with whatever the line reader had already
//!   buffered past the header block and continues with fresh socket reads.
//! - [`ResponseBody`]: either bytes held in memory or an open file with a
//!   known length that is streamed to the socket.
//!
//! Neither side ever buffers a whole file body; only [`ReqBody::bytes`]
//! collects a request body into memory, and only when a handler asks for it.

mod req_body;
mod resp_body;

pub use req_body::ReqBody;
pub use resp_body::ResponseBody;
pub(crate) use resp_body::Kind;
