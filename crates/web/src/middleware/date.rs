//! RFC 7231 `date` response header.
//!
//! Formatting a date on every response is wasteful, so [`DateService`]
//! caches the rendered value and re-renders it at most once per update
//! interval. Readers never block: the cached value lives in an
//! [`ArcSwap`] and is swapped wholesale.

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use async_trait::async_trait;
use bare_http::handler::{Handler, HandlerError};
use bare_http::protocol::{Request, Response};
use http::header::DATE;
use once_cell::sync::Lazy;

use crate::decorator::Decorator;

static DATE_SERVICE: Lazy<DateService> = Lazy::new(|| DateService::with_update_interval(Duration::from_millis(800)));

#[derive(Debug)]
struct RenderedDate {
    rendered_at: Instant,
    value: Arc<str>,
}

impl RenderedDate {
    fn now() -> Self {
        let mut buf = faf_http_date::get_date_buff_no_key();
        faf_http_date::get_date_no_key(&mut buf);
        Self { rendered_at: Instant::now(), value: String::from_utf8_lossy(&buf).into() }
    }
}

/// Keeps a recently rendered HTTP date string.
#[derive(Debug)]
pub struct DateService {
    current: ArcSwap<RenderedDate>,
    update_interval: Duration,
}

impl DateService {
    /// The process-wide instance used by [`DateHeader`].
    pub fn get_global_instance() -> &'static DateService {
        &DATE_SERVICE
    }

    pub fn with_update_interval(update_interval: Duration) -> Self {
        Self { current: ArcSwap::from_pointee(RenderedDate::now()), update_interval }
    }

    /// The current date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
    pub fn http_date(&self) -> Arc<str> {
        let current = self.current.load();
        if current.rendered_at.elapsed() < self.update_interval {
            return Arc::clone(&current.value);
        }

        let fresh = RenderedDate::now();
        let value = Arc::clone(&fresh.value);
        self.current.store(Arc::new(fresh));
        value
    }
}

/// Adds a `date` header to every response.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateHeader;

impl<H: Handler> Decorator<H> for DateHeader {
    type Out = DateHandler<H>;

    fn decorate(&self, handler: H) -> Self::Out {
        DateHandler { handler, date_service: DateService::get_global_instance() }
    }
}

#[derive(Debug)]
pub struct DateHandler<H> {
    handler: H,
    date_service: &'static DateService,
}

#[async_trait]
impl<H: Handler> Handler for DateHandler<H> {
    async fn call(&self, req: Request) -> Result<Response, HandlerError> {
        let mut response = self.handler.call(req).await?;
        response.headers_mut().set(DATE.as_str(), &*self.date_service.http_date());
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bare_http::handler::make_handler;
    use http::StatusCode;

    #[test]
    fn renders_imf_fixdate() {
        let date = DateService::with_update_interval(Duration::from_secs(60)).http_date();

        assert_eq!(date.len(), 29);
        assert!(date.ends_with(" GMT"));
        assert_eq!(&date[3..5], ", ");
    }

    #[test]
    fn value_is_cached_within_interval() {
        let service = DateService::with_update_interval(Duration::from_secs(3600));
        let first = service.http_date();
        let second = service.http_date();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn date_header_is_added() {
        let handler = DateHeader.decorate(make_handler(|_req: Request| async {
            Ok::<_, HandlerError>(Response::builder().header("date", "stale").body("ok"))
        }));

        let response = handler.call(Request::builder().build()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get_all("date").len(), 1);
        assert!(response.headers().get("date").is_some_and(|date| date.ends_with(" GMT")));
    }
}
