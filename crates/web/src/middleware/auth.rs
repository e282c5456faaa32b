use std::sync::Arc;

use async_trait::async_trait;
use bare_http::handler::{Handler, HandlerError};
use bare_http::protocol::{Request, Response};
use http::header::AUTHORIZATION;
use tracing::debug;

use crate::decorator::Decorator;

/// Requires `authorization: Bearer <token>` on every request.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    expected: Arc<str>,
}

impl BearerAuth {
    pub fn new(token: impl AsRef<str>) -> Self {
        Self { expected: format!("Bearer {}", token.as_ref()).into() }
    }
}

impl<H: Handler> Decorator<H> for BearerAuth {
    type Out = AuthHandler<H>;

    fn decorate(&self, handler: H) -> Self::Out {
        AuthHandler { handler, expected: Arc::clone(&self.expected) }
    }
}

/// Wraps `handler` so it only runs for requests carrying the bearer `token`.
pub fn wrap_auth<H: Handler>(handler: H, token: impl AsRef<str>) -> AuthHandler<H> {
    BearerAuth::new(token).decorate(handler)
}

/// Delegates to the inner handler when the last `authorization` value is
/// exactly `Bearer <token>`, and answers `403 Forbidden` otherwise.
#[derive(Debug)]
pub struct AuthHandler<H> {
    handler: H,
    expected: Arc<str>,
}

#[async_trait]
impl<H: Handler> Handler for AuthHandler<H> {
    async fn call(&self, req: Request) -> Result<Response, HandlerError> {
        if req.header(AUTHORIZATION.as_str()) == Some(&*self.expected) {
            return self.handler.call(req).await;
        }

        debug!(path = req.path(), "rejecting request without valid bearer token");
        Ok(Response::forbidden())
    }
}
