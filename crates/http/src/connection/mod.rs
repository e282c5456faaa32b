//! One request per connection.
//!
//! [`HttpConnection`] reads a single request, answers it and closes the
//! stream. There is no keep-alive: every connection carries exactly one
//! exchange.

mod http_connection;

pub use http_connection::{DRAIN_TIMEOUT, HttpConnection, MAX_DRAIN_BYTES};
