//! Prefix routing.
//!
//! A [`Router`] holds `(prefix, handler)` pairs in mount order. A request
//! goes to the first handler whose prefix starts its path, with that prefix
//! stripped. The empty prefix matches everything, so it belongs last.

use async_trait::async_trait;
use bare_http::handler::{Handler, HandlerError};
use bare_http::protocol::{Request, Response};
use tracing::{debug, error, warn};

use crate::decorator::{Decorator, IdentityDecorator, Layered};

/// Ordered prefix table. Read-only once built.
pub struct Router {
    routes: Vec<Route>,
}

struct Route {
    prefix: String,
    handler: Box<dyn Handler>,
}

impl Router {
    /// Creates a new router builder with no decorators
    pub fn builder() -> RouterBuilder<IdentityDecorator> {
        RouterBuilder::new()
    }

    /// Sends `req` to the first matching handler.
    ///
    /// Always produces a response: a failing handler and an unmatched path
    /// both become `500 Internal Server Error`.
    pub async fn dispatch(&self, req: Request) -> Response {
        let Some(route) = self.routes.iter().find(|route| req.path().starts_with(&route.prefix)) else {
            warn!(path = req.path(), "no route matched");
            return Response::internal_server_error();
        };

        let rest = req.path()[route.prefix.len()..].to_string();
        debug!(prefix = route.prefix.as_str(), path = rest.as_str(), "route matched");

        match route.handler.call(req.with_path(rest)).await {
            Ok(response) => response,
            Err(e) => {
                error!(prefix = route.prefix.as_str(), cause = %e, "handler failed");
                Response::internal_server_error()
            }
        }
    }

    /// Mounted prefixes, in match order.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|route| route.prefix.as_str())
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router").field("prefixes", &self.prefixes().collect::<Vec<_>>()).finish()
    }
}

#[async_trait]
impl Handler for Router {
    async fn call(&self, req: Request) -> Result<Response, HandlerError> {
        Ok(self.dispatch(req).await)
    }
}

pub struct RouterBuilder<D> {
    routes: Vec<(String, Box<dyn Handler>)>,
    decorator: D,
}

impl RouterBuilder<IdentityDecorator> {
    fn new() -> Self {
        Self { routes: Vec::new(), decorator: IdentityDecorator }
    }
}

impl<D> RouterBuilder<D> {
    /// Appends a route. Earlier mounts win over later ones.
    pub fn mount(mut self, prefix: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.routes.push((prefix.into(), Box::new(handler)));
        self
    }

    /// Wraps every mounted handler with `decorator` at build time, outside
    /// any decorator added before it.
    pub fn with_global_decorator<D2>(self, decorator: D2) -> RouterBuilder<Layered<D, D2>>
    where
        D: Decorator<Box<dyn Handler>>,
        D2: Decorator<D::Out>,
    {
        RouterBuilder { routes: self.routes, decorator: Layered::new(self.decorator, decorator) }
    }

    pub fn build(self) -> Router
    where
        D: Decorator<Box<dyn Handler>>,
        D::Out: 'static,
    {
        let routes = self
            .routes
            .into_iter()
            .map(|(prefix, handler)| {
                let handler: Box<dyn Handler> = Box::new(self.decorator.decorate(handler));
                Route { prefix, handler }
            })
            .collect();

        Router { routes }
    }
}

impl<D> std::fmt::Debug for RouterBuilder<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefixes = self.routes.iter().map(|(prefix, _)| prefix.as_str()).collect::<Vec<_>>();
        f.debug_struct("RouterBuilder").field("prefixes", &prefixes).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::BearerAuth;
    use bare_http::handler::make_handler;
    use http::StatusCode;
    use mockall::mock;

    mock! {
        Endpoint {}

        #[async_trait]
        impl Handler for Endpoint {
            async fn call(&self, req: Request) -> Result<Response, HandlerError>;
        }
    }

    fn echo(name: &'static str) -> impl Handler {
        make_handler(move |req: Request| async move {
            Ok::<_, HandlerError>(Response::text(StatusCode::OK, format!("{name}:{}", req.path())))
        })
    }

    async fn body_of(response: Response) -> String {
        let mut wire = Vec::new();
        response.send(&mut wire).await.unwrap();
        let wire = String::from_utf8(wire).unwrap();
        wire.split_once("\r\n\r\n").unwrap().1.to_string()
    }

    #[tokio::test]
    async fn first_matching_prefix_wins_and_is_stripped() {
        let router = Router::builder().mount("/api/v1", echo("v1")).mount("/api", echo("api")).mount("", echo("root")).build();

        assert_eq!(body_of(router.dispatch(Request::builder().path("/api/v1/users").build()).await).await, "v1:/users");
        assert_eq!(body_of(router.dispatch(Request::builder().path("/api/other").build()).await).await, "api:/other");
        assert_eq!(body_of(router.dispatch(Request::builder().path("/index.html").build()).await).await, "root:/index.html");
    }

    #[tokio::test]
    async fn catch_all_mounted_first_shadows_everything() {
        let mut never = MockEndpoint::new();
        never.expect_call().never();

        let router = Router::builder().mount("", echo("root")).mount("/api", never).build();

        assert_eq!(body_of(router.dispatch(Request::builder().path("/api/x").build()).await).await, "root:/api/x");
    }

    #[tokio::test]
    async fn no_match_is_500() {
        let router = Router::builder().mount("/static", echo("static")).build();

        let response = router.dispatch(Request::builder().path("/elsewhere").build()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn failing_handler_is_500() {
        let mut failing = MockEndpoint::new();
        failing.expect_call().times(1).returning(|_| Err("no database".into()));

        let router = Router::builder().mount("/db", failing).build();

        let response = router.dispatch(Request::builder().path("/db/query").build()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, "Internal Server Error");
    }

    #[tokio::test]
    async fn method_and_headers_survive_rewrite() {
        let mut endpoint = MockEndpoint::new();
        endpoint
            .expect_call()
            .withf(|req| req.method() == "POST" && req.path() == "/upload" && req.header("x-id") == Some("7"))
            .times(1)
            .returning(|_| Ok(Response::new(StatusCode::ACCEPTED)));

        let router = Router::builder().mount("/files", endpoint).build();
        let req = Request::builder().method("post").path("/files/upload").header("X-Id", "7").build();

        assert_eq!(router.dispatch(req).await.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn global_decorator_wraps_every_route() {
        let router = Router::builder()
            .mount("/a", echo("a"))
            .mount("/b", echo("b"))
            .with_global_decorator(BearerAuth::new("s3cret"))
            .build();

        for path in ["/a", "/b/c"] {
            let denied = router.dispatch(Request::builder().path(path).build()).await;
            assert_eq!(denied.status(), StatusCode::FORBIDDEN);

            let allowed = router.dispatch(Request::builder().path(path).header("authorization", "Bearer s3cret").build()).await;
            assert_eq!(allowed.status(), StatusCode::OK);
        }
        assert_eq!(router.prefixes().collect::<Vec<_>>(), ["/a", "/b"]);
    }
}
