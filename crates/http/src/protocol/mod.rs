//! Request and response types.
//!
//! - [`Request`] / [`RequestBuilder`]: method, path, headers and a handle to the unread body
//! - [`Response`] / [`ResponseBuilder`]: status, headers and a [`ResponseBody`]
//! - [`HeaderMap`]: case-insensitive, multi-valued header storage
//! - [`body`]: request and response bodies
//! - errors: [`HttpError`], [`ParseError`], [`SendError`]

mod header;
pub use header::HeaderMap;

mod request;
pub(crate) use request::content_length;
pub use request::{Request, RequestBuilder};

mod response;
pub use response::{Response, ResponseBuilder, ResponseHead};

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

pub mod body;
pub use body::{ReqBody, ResponseBody};
