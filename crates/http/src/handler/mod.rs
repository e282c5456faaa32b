//! The request handler seam.
//!
//! A [`Handler`] turns one [`Request`] into one [`Response`]. Any error it
//! returns is answered with `500 Internal Server Error` by the connection.
//! Plain async functions become handlers through [`make_handler`].

use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;

use crate::protocol::{Request, Response};

/// The error a handler may fail with.
pub type HandlerError = Box<dyn Error + Send + Sync>;

#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, req: Request) -> Result<Response, HandlerError>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<Err, F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Err: Into<HandlerError>,
    Fut: Future<Output = Result<Response, Err>> + Send,
{
    async fn call(&self, req: Request) -> Result<Response, HandlerError> {
        (self.f)(req).await.map_err(Into::into)
    }
}

pub fn make_handler<F, Err, Ret>(f: F) -> HandlerFn<F>
where
    Err: Into<HandlerError>,
    Ret: Future<Output = Result<Response, Err>>,
    F: Fn(Request) -> Ret,
{
    HandlerFn { f }
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Box<H> {
    async fn call(&self, req: Request) -> Result<Response, HandlerError> {
        (**self).call(req).await
    }
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    async fn call(&self, req: Request) -> Result<Response, HandlerError> {
        (**self).call(req).await
    }
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for &H {
    async fn call(&self, req: Request) -> Result<Response, HandlerError> {
        (**self).call(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    async fn echo_path(req: Request) -> Result<Response, HandlerError> {
        Ok(Response::text(StatusCode::OK, req.path().to_string()))
    }

    #[tokio::test]
    async fn functions_are_handlers() {
        let handler = make_handler(echo_path);
        let response = handler.call(Request::builder().path("/hello").build()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().length(), 6);
    }

    #[tokio::test]
    async fn boxed_and_shared_handlers_delegate() {
        let boxed: Box<dyn Handler> = Box::new(make_handler(|_req: Request| async {
            Err::<Response, _>(std::io::Error::other("boom"))
        }));
        let shared = Arc::new(boxed);

        let result = shared.call(Request::builder().build()).await;
        assert_eq!(result.unwrap_err().to_string(), "boom");
    }
}
