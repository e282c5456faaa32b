//! Handler decorators.
//!
//! A [`Decorator`] wraps one [`Handler`] in another, the way middleware
//! such as [`BearerAuth`](crate::middleware::BearerAuth) and
//! [`DateHeader`](crate::middleware::DateHeader) do. The router applies one
//! decorator stack to every mounted handler; it grows through
//! [`RouterBuilder::with_global_decorator`](crate::router::RouterBuilder::with_global_decorator).

use bare_http::handler::Handler;

pub trait Decorator<H: Handler> {
    type Out: Handler;

    fn decorate(&self, handler: H) -> Self::Out;
}

/// Hands the handler back unchanged. The bottom of every stack.
#[derive(Default, Clone, Copy, Debug)]
pub struct IdentityDecorator;

impl<H: Handler> Decorator<H> for IdentityDecorator {
    type Out = H;

    #[inline(always)]
    fn decorate(&self, handler: H) -> Self::Out {
        handler
    }
}

/// `inner` wraps the handler first, `outer` wraps the result, so `outer`
/// sees each request before `inner` does.
#[derive(Debug, Clone, Copy)]
pub struct Layered<Inner, Outer> {
    inner: Inner,
    outer: Outer,
}

impl<Inner, Outer> Layered<Inner, Outer> {
    pub fn new(inner: Inner, outer: Outer) -> Self {
        Self { inner, outer }
    }
}

impl<H, Inner, Outer> Decorator<H> for Layered<Inner, Outer>
where
    H: Handler,
    Inner: Decorator<H>,
    Outer: Decorator<Inner::Out>,
{
    type Out = Outer::Out;

    fn decorate(&self, handler: H) -> Self::Out {
        self.outer.decorate(self.inner.decorate(handler))
    }
}
