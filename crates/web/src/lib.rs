//! Routing, middleware, static files and a worker-pool server on top of `bare-http`.
//!
//! - [`Router`]: ordered prefix routing with prefix stripping
//! - [`middleware`]: bearer-token auth and the `date` header
//! - [`static_files`]: a directory-backed handler with a traversal guard
//! - [`pool`]: the bounded connection queue and its workers
//! - [`Server`]: binds, accepts and shuts down gracefully
//!
//! # Example
//!
//! ```no_run
//! use bare_web::middleware::wrap_auth;
//! use bare_web::{Router, Server, make_static_handler};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::builder()
//!         .mount("/private", wrap_auth(make_static_handler("./private"), "t0kEn"))
//!         .mount("", make_static_handler("./public"))
//!         .build();
//!
//!     Server::builder().port(9000).router(router).build()?.run().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod server;

pub mod decorator;
pub mod middleware;
pub mod pool;
pub mod router;
pub mod static_files;

pub use config::ServerConfig;
pub use router::{Router, RouterBuilder};
pub use server::{BoundServer, Server, ServerBuildError, ServerBuilder, ServerError};
pub use static_files::{StaticFiles, make_static_handler};
