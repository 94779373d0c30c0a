//! Handler chains and the interceptor that drives them

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::trace;

use super::context::CallContext;
use super::{InterceptError, Invocable};
use crate::instance::Instance;

/// Synchronous interception handler
pub type SyncHandler = Arc<dyn Fn(&mut CallContext, SyncNext<'_>) + Send + Sync>;

/// Wrap a closure as a [`SyncHandler`]
pub fn sync_handler<F>(handler: F) -> SyncHandler
where
    F: Fn(&mut CallContext, SyncNext<'_>) + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// Continuation handed to a sync handler
pub struct SyncNext<'a> {
    handlers: &'a [SyncHandler],
    target: &'a dyn Invocable,
    method: &'a str,
}

impl<'a> SyncNext<'a> {
    /// Run the rest of the chain, ending with the real method
    pub fn run(self, ctx: &mut CallContext) {
        match self.handlers.split_first() {
            Some((handler, rest)) => handler(
                ctx,
                SyncNext {
                    handlers: rest,
                    target: self.target,
                    method: self.method,
                },
            ),
            None => {
                if ctx.error.is_some() {
                    return;
                }
                match self.target.call_sync(self.method, ctx.arguments.clone()) {
                    Ok(value) => ctx.return_value = value,
                    Err(err) => ctx.error = Some(err),
                }
            }
        }
    }
}

/// Asynchronous interception handler
#[async_trait]
pub trait AsyncCallHandler: Send + Sync {
    async fn handle(&self, ctx: &mut CallContext, next: AsyncNext<'_>);
}

pub type AsyncHandler = Arc<dyn AsyncCallHandler>;

struct FnHandler<F>(F);

#[async_trait]
impl<F> AsyncCallHandler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut CallContext, AsyncNext<'a>) -> BoxFuture<'a, ()> + Send + Sync,
{
    async fn handle(&self, ctx: &mut CallContext, next: AsyncNext<'_>) {
        (self.0)(ctx, next).await
    }
}

/// Wrap a closure returning a boxed future as an [`AsyncHandler`]
///
/// ```
/// use rivet_di::intercept::async_handler;
///
/// let handler = async_handler(|ctx, next| {
///     Box::pin(async move {
///         next.run(ctx).await;
///         ctx.return_value = serde_json::json!("wrapped");
///     })
/// });
/// # drop(handler);
/// ```
pub fn async_handler<F>(handler: F) -> AsyncHandler
where
    F: for<'a> Fn(&'a mut CallContext, AsyncNext<'a>) -> BoxFuture<'a, ()> + Send + Sync + 'static,
{
    Arc::new(FnHandler(handler))
}

/// Continuation handed to an async handler
pub struct AsyncNext<'a> {
    handlers: &'a [AsyncHandler],
    target: &'a dyn Invocable,
    method: &'a str,
}

impl<'a> AsyncNext<'a> {
    /// Run the rest of the chain, ending with the real method
    pub async fn run(self, ctx: &mut CallContext) {
        match self.handlers.split_first() {
            Some((handler, rest)) => {
                let next = AsyncNext {
                    handlers: rest,
                    target: self.target,
                    method: self.method,
                };
                handler.handle(ctx, next).await
            }
            None => {
                if ctx.error.is_some() {
                    return;
                }
                let args = ctx.arguments.clone();
                match self.target.call(self.method, args).await {
                    Ok(value) => ctx.return_value = value,
                    Err(err) => ctx.error = Some(err),
                }
            }
        }
    }
}

/// Ordered handlers applied to one method, in a single mode
#[derive(Clone)]
pub enum Interceptor {
    Sync(Vec<SyncHandler>),
    Async(Vec<AsyncHandler>),
}

impl Interceptor {
    pub fn is_async(&self) -> bool {
        matches!(self, Interceptor::Async(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Interceptor::Sync(handlers) => handlers.len(),
            Interceptor::Async(handlers) => handlers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append the handlers of `other` when both share a mode
    pub(crate) fn extend(&mut self, other: &Interceptor) {
        match (self, other) {
            (Interceptor::Sync(mine), Interceptor::Sync(theirs)) => mine.extend(theirs.iter().cloned()),
            (Interceptor::Async(mine), Interceptor::Async(theirs)) => mine.extend(theirs.iter().cloned()),
            _ => {}
        }
    }

    /// Run the chain for a synchronous call
    pub fn handle_call_sync(
        &self,
        instance: &Instance,
        method: &str,
        args: Vec<Value>,
        target: &dyn Invocable,
    ) -> anyhow::Result<Value> {
        let Interceptor::Sync(handlers) = self else {
            return Err(InterceptError::AsyncMethod {
                method: method.to_string(),
            }
            .into());
        };

        trace!(method, handlers = handlers.len(), "intercepting sync call");
        let mut ctx = CallContext::new(instance.clone(), method, args);
        SyncNext {
            handlers,
            target,
            method,
        }
        .run(&mut ctx);
        ctx.into_result()
    }

    /// Run the chain for an asynchronous call.
    ///
    /// Sync chains run inline and end in the target's `call_sync`, so a
    /// target's own async `call` is not reached for methods intercepted
    /// in sync mode.
    pub async fn handle_call(
        &self,
        instance: &Instance,
        method: &str,
        args: Vec<Value>,
        target: &dyn Invocable,
    ) -> anyhow::Result<Value> {
        match self {
            Interceptor::Sync(_) => self.handle_call_sync(instance, method, args, target),
            Interceptor::Async(handlers) => {
                trace!(method, handlers = handlers.len(), "intercepting async call");
                let mut ctx = CallContext::new(instance.clone(), method, args);
                AsyncNext {
                    handlers,
                    target,
                    method,
                }
                .run(&mut ctx)
                .await;
                ctx.into_result()
            }
        }
    }
}
