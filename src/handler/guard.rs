//! Guards: request-time checks that run before a handler.
//!
//! A guard sees the context built so far and either lets the request through
//! (optionally injecting typed values for everything downstream) or rejects it
//! with a status error. Chains run left-to-right and stop at the first rejection.

use axum::http::Extensions;
use futures_util::future::{self, BoxFuture};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::{BoxHandler, Context, Handler};
use crate::error::RouteError;

/// Values a guard adds to the context.
#[derive(Debug, Default)]
pub struct Injection(Extensions);

impl Injection {
    pub fn none() -> Self {
        Self::default()
    }

    /// Add another value.
    pub fn and<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.0.insert(value);
        self
    }

    pub fn into_extensions(self) -> Extensions {
        self.0
    }
}

/// Inject a single typed value.
pub fn inject<T: Clone + Send + Sync + 'static>(value: T) -> Injection {
    Injection::none().and(value)
}

impl From<()> for Injection {
    fn from(_: ()) -> Self {
        Self::none()
    }
}

impl From<Extensions> for Injection {
    fn from(extensions: Extensions) -> Self {
        Self(extensions)
    }
}

type GuardFuture = BoxFuture<'static, Result<Injection, RouteError>>;
type GuardFn = dyn Fn(&Context) -> GuardFuture + Send + Sync;

/// A composable pre-handler check.
#[derive(Clone)]
pub struct Guard {
    check: Arc<GuardFn>,
}

impl Guard {
    /// A synchronous guard.
    pub fn new<F, I>(check: F) -> Self
    where
        F: Fn(&Context) -> Result<I, RouteError> + Send + Sync + 'static,
        I: Into<Injection>,
    {
        Self {
            check: Arc::new(move |ctx: &Context| {
                let outcome = check(ctx).map(Into::into);
                Box::pin(future::ready(outcome)) as GuardFuture
            }),
        }
    }

    /// An asynchronous guard. The future must own what it needs from the context.
    pub fn new_async<F, Fut, I>(check: F) -> Self
    where
        F: Fn(&Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<I, RouteError>> + Send + 'static,
        I: Into<Injection>,
    {
        Self {
            check: Arc::new(move |ctx: &Context| {
                let fut = check(ctx);
                Box::pin(async move { fut.await.map(Into::into) }) as GuardFuture
            }),
        }
    }

    /// Run the check against `ctx`.
    pub fn check(&self, ctx: &Context) -> GuardFuture {
        (self.check)(ctx)
    }

    /// Wrap a handler so this guard runs first.
    pub fn wrap<H: Handler>(&self, handler: H) -> BoxHandler {
        chain(vec![self.clone()], super::boxed(handler))
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}

/// Compose guards in front of a handler, left-to-right.
pub fn chain(guards: Vec<Guard>, handler: BoxHandler) -> BoxHandler {
    if guards.is_empty() {
        return handler;
    }
    let guards: Arc<[Guard]> = guards.into();
    Arc::new(move |mut ctx: Context| {
        let guards = Arc::clone(&guards);
        let handler = Arc::clone(&handler);
        async move {
            for guard in guards.iter() {
                let injection = guard.check(&ctx).await?;
                ctx.extend(injection.into_extensions());
            }
            handler.call(ctx).await
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::status;
    use crate::handler::Reply;
    use axum::http::StatusCode;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Clone)]
    struct A(i64);
    #[derive(Clone)]
    struct B(i64);

    fn sum_handler() -> BoxHandler {
        super::super::boxed(|ctx: Context| async move {
            let a = ctx.get::<A>().map(|a| a.0).unwrap_or_default();
            let b = ctx.get::<B>().map(|b| b.0).unwrap_or_default();
            Ok::<_, RouteError>(a + b)
        })
    }

    fn value(reply: Reply) -> i64 {
        reply.as_value().and_then(|v| v.as_i64()).unwrap()
    }

    #[tokio::test]
    async fn test_guards_merge_left_to_right() {
        let first = Guard::new(|_| Ok(inject(A(1))));
        // Sees what the first guard injected.
        let second = Guard::new(|ctx| {
            let a = ctx.get::<A>().map(|a| a.0).unwrap_or_default();
            Ok(inject(B(a + 1)))
        });

        let handler = chain(vec![first, second], sum_handler());
        let reply = handler.call(Context::default()).await.unwrap();
        assert_eq!(value(reply), 3);
    }

    #[tokio::test]
    async fn test_rejection_aborts_before_handler() {
        let reached = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&reached);
        let inner = super::super::boxed(move |_ctx: Context| {
            let flag = Arc::clone(&flag);
            async move {
                flag.store(true, Ordering::SeqCst);
                Ok::<_, RouteError>("reached")
            }
        });

        let deny = Guard::new(|_| Err::<(), _>(status(401, "Unauthorized")));
        let err = chain(vec![deny], inner).call(Context::default()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(!reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_async_guard() {
        let guard = Guard::new_async(|ctx: &Context| {
            let id = ctx.param("id").map(str::to_owned);
            async move {
                tokio::task::yield_now().await;
                match id.as_deref() {
                    Some("123") => Ok(()),
                    _ => Err(status(404, "Not found")),
                }
            }
        });

        let handler = guard.wrap(|_ctx: Context| async { Ok::<_, RouteError>("test") });

        let mut ctx = Context::default();
        ctx.raw_params.insert("id".into(), "123".into());
        assert!(handler.call(ctx).await.is_ok());

        let mut ctx = Context::default();
        ctx.raw_params.insert("id".into(), "124".into());
        assert!(handler.call(ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_nested_wrap() {
        let outer = Guard::new(|_| Ok(inject(A(1))));
        let inner = Guard::new(|_| Ok(inject(B(2))));
        let handler = chain(vec![outer], inner.wrap(|ctx: Context| sum_handler().call(ctx)));
        assert_eq!(value(handler.call(Context::default()).await.unwrap()), 3);
    }
}
