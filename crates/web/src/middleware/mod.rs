//! Handler wrappers.
//!
//! Each middleware comes in two shapes: a [`Decorator`](crate::decorator::Decorator)
//! ([`BearerAuth`], [`DateHeader`]) for composing or
//! [`with_global_decorator`](crate::router::RouterBuilder::with_global_decorator),
//! and the wrapping [`Handler`](bare_http::handler::Handler) it produces.

mod auth;
mod date;

pub use auth::{AuthHandler, BearerAuth, wrap_auth};
pub use date::{DateHandler, DateHeader, DateService};
