//! Handler contract.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::request_event::RequestEvent;
use crate::signal::Flow;

/// One link in a route's handler chain.
///
/// A handler may read and mutate the event, call [`RequestEvent::next`] to
/// run the rest of the chain before continuing, or return a short-circuit
/// [`Flow`]. An `Err` propagates to whoever drives the pipeline.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, ev: &mut RequestEvent) -> anyhow::Result<Flow>;
}

/// Shared handler reference.
pub type BoxedHandler = Arc<dyn RequestHandler>;

/// Ordered, read-only handler list for one matched route.
pub type HandlerChain = Arc<[BoxedHandler]>;

/// Adapter turning a closure into a [`RequestHandler`].
pub struct HandlerFn<F>(F);

#[async_trait]
impl<F> RequestHandler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut RequestEvent) -> BoxFuture<'a, anyhow::Result<Flow>> + Send + Sync,
{
    async fn handle(&self, ev: &mut RequestEvent) -> anyhow::Result<Flow> {
        (self.0)(ev).await
    }
}

/// Wrap a closure as a shared handler.
///
/// ```ignore
/// let h = handler_fn(|ev| Box::pin(async move {
///     ev.headers_mut()?.set("X-Layout", "root")?;
///     ev.next().await
/// }));
/// ```
pub fn handler_fn<F>(f: F) -> BoxedHandler
where
    F: for<'a> Fn(&'a mut RequestEvent) -> BoxFuture<'a, anyhow::Result<Flow>> + Send + Sync + 'static,
{
    Arc::new(HandlerFn(f))
}
