//! Handlers, their context, guards and replies.
//!
//! # Data Flow
//! ```text
//! Context (raw + validated channels, request head, extensions)
//!     → guard.rs (left-to-right checks, may inject typed values or reject)
//!     → Handler::call
//!     → reply.rs (IntoReply → Reply → HTTP response)
//! ```
//!
//! # Design Decisions
//! - Handlers are uniformly async; a synchronous guard is just a ready future
//! - Guard-injected values live in a typed extension store, not a loose map
//! - Handlers and guards are type-erased once, at route registration

pub mod context;
pub mod guard;
pub mod reply;

use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

use crate::error::RouteError;

pub use context::Context;
pub use guard::{inject, Guard, Injection};
pub use reply::{IntoReply, Json, Reply};

/// Future returned by a type-erased handler.
pub type HandlerFuture = BoxFuture<'static, Result<Reply, RouteError>>;

/// Something that turns a request context into a reply.
///
/// Implemented for every `Fn(Context) -> impl Future<Output = Result<impl IntoReply, RouteError>>`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: Context) -> HandlerFuture;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, RouteError>> + Send + 'static,
    R: IntoReply,
{
    fn call(&self, ctx: Context) -> HandlerFuture {
        let fut = (self)(ctx);
        Box::pin(async move { fut.await.map(IntoReply::into_reply) })
    }
}

/// Shared, type-erased handler.
pub type BoxHandler = Arc<dyn Handler>;

pub(crate) fn boxed<H: Handler>(handler: H) -> BoxHandler {
    Arc::new(handler)
}
