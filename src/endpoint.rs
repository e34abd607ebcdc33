//! Endpoints, handlers and endpoint metadata.
//!
//! A handler is anything implementing [`Handler`]; plain functions and
//! closures become handlers through [`make_sync`] and [`make_async`], each
//! compiled once at registration time into the uniform
//! `invoke(context) -> result` shape. No reflection happens at request
//! time.

use std::{
    any::Any,
    fmt::{self, Debug, Formatter},
    future::Future,
    sync::Arc,
};

use crate::{dispatch::RouteContext, pattern::RoutePattern};

/// The error half of a handler outcome, opaque to the router.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// What a handler produces; the router propagates it without interpreting
/// it.
pub type HandlerResult = Result<(), HandlerError>;

/// A request handler.
#[async_trait::async_trait]
pub trait Handler: Send + Sync {
    /// Handles a routed request.
    async fn invoke(&self, ctx: RouteContext) -> HandlerResult;
}

/// Conversion into a [`HandlerResult`], so handler functions can return
/// `()` or any `Result<(), E>`.
pub trait IntoHandlerResult {
    /// Performs the conversion.
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<E> IntoHandlerResult for Result<(), E>
where
    E: Into<HandlerError>,
{
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(Into::into)
    }
}

/// A synchronous function compiled into a [`Handler`].
pub struct SyncFnHandler<F> {
    f: F,
}

#[async_trait::async_trait]
impl<F, R> Handler for SyncFnHandler<F>
where
    F: Fn(RouteContext) -> R + Send + Sync,
    R: IntoHandlerResult + Send,
{
    async fn invoke(&self, ctx: RouteContext) -> HandlerResult {
        (self.f)(ctx).into_handler_result()
    }
}

/// An asynchronous function compiled into a [`Handler`].
pub struct AsyncFnHandler<F> {
    f: F,
}

#[async_trait::async_trait]
impl<F, Fut, R> Handler for AsyncFnHandler<F>
where
    F: Fn(RouteContext) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send,
    R: IntoHandlerResult + Send,
{
    async fn invoke(&self, ctx: RouteContext) -> HandlerResult {
        (self.f)(ctx).await.into_handler_result()
    }
}

/// Creates a handler from a synchronous function.
///
/// # Example
///
/// ```
/// use waymark::make_sync;
///
/// let handler = make_sync(|ctx| {
///     let name = ctx.values().get_str("name").unwrap_or("world").to_string();
///     drop(name);
/// });
/// # let _ = handler;
/// ```
pub fn make_sync<F, R>(f: F) -> SyncFnHandler<F>
where
    F: Fn(RouteContext) -> R + Send + Sync,
    R: IntoHandlerResult + Send,
{
    SyncFnHandler { f }
}

/// Creates a handler from an asynchronous function.
pub fn make_async<F, Fut, R>(f: F) -> AsyncFnHandler<F>
where
    F: Fn(RouteContext) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send,
    R: IntoHandlerResult + Send,
{
    AsyncFnHandler { f }
}

/// An ordered collection of opaque metadata attached to an endpoint.
///
/// Items append at registration time only. Typed queries walk the
/// collection: [`get`](Metadata::get) returns the most recently added item
/// of the type, [`get_all`](Metadata::get_all) every item in registration
/// order. The router stores and exposes metadata; it never interprets it.
#[derive(Default, Clone)]
pub struct Metadata {
    items: Vec<Arc<dyn Any + Send + Sync>>,
}

impl Metadata {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item.
    pub fn push<T: Any + Send + Sync>(&mut self, item: T) {
        self.items.push(Arc::new(item));
    }

    /// The most recently added item of type `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.items
            .iter()
            .rev()
            .find_map(|item| item.downcast_ref::<T>())
    }

    /// Every item of type `T`, in registration order.
    pub fn get_all<T: Any + Send + Sync>(&self) -> Vec<&T> {
        self.items
            .iter()
            .filter_map(|item| item.downcast_ref::<T>())
            .collect()
    }

    /// The number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when the collection has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Debug for Metadata {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Metadata").field(&self.items.len()).finish()
    }
}

/// A registered endpoint: a pattern bound to a handler with its order,
/// display name and metadata. Immutable once created and shared read-only
/// across concurrent requests.
pub struct Endpoint {
    pattern: RoutePattern,
    handler: Arc<dyn Handler>,
    order: i32,
    display_name: Option<String>,
    metadata: Metadata,
}

impl Endpoint {
    /// Creates an endpoint.
    pub fn new(
        pattern: RoutePattern,
        handler: Arc<dyn Handler>,
        order: i32,
        display_name: Option<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            pattern,
            handler,
            order,
            display_name,
            metadata,
        }
    }

    /// The endpoint's route pattern.
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// The endpoint's handler.
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// The explicit order; lower values rank first.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// The display name, if one was registered.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// A name for diagnostics: the display name when present, the template
    /// text otherwise.
    pub fn name_for_display(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.pattern.template())
    }

    /// The endpoint's metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

impl Debug for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("pattern", &self.pattern.template())
            .field("order", &self.order)
            .field("display_name", &self.display_name)
            .field("metadata", &self.metadata)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct AllowAnonymous;

    #[derive(Debug, PartialEq)]
    struct RequireRole(&'static str);

    #[test]
    fn test_metadata_typed_queries() {
        let mut metadata = Metadata::new();
        metadata.push(AllowAnonymous);
        metadata.push(RequireRole("admin"));
        metadata.push(RequireRole("owner"));

        // most recently added wins
        assert_eq!(metadata.get::<RequireRole>(), Some(&RequireRole("owner")));
        assert_eq!(metadata.get::<AllowAnonymous>(), Some(&AllowAnonymous));
        assert_eq!(
            metadata.get_all::<RequireRole>(),
            vec![&RequireRole("admin"), &RequireRole("owner")]
        );
        assert_eq!(metadata.len(), 3);
    }

    #[test]
    fn test_metadata_absent_type() {
        let metadata = Metadata::new();
        assert_eq!(metadata.get::<AllowAnonymous>(), None);
        assert!(metadata.get_all::<RequireRole>().is_empty());
    }

    #[tokio::test]
    async fn test_sync_handler_adapters() {
        use crate::dispatch::RouteContext;

        let ok = make_sync(|_ctx| ());
        assert!(ok.invoke(RouteContext::new("/")).await.is_ok());

        let failing = make_sync(|_ctx| -> Result<(), std::io::Error> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
        });
        assert!(failing.invoke(RouteContext::new("/")).await.is_err());
    }

    #[tokio::test]
    async fn test_async_handler_adapter() {
        use crate::dispatch::RouteContext;

        let handler = make_async(|ctx: RouteContext| async move {
            assert_eq!(ctx.path(), "/greet");
        });
        assert!(handler.invoke(RouteContext::new("/greet")).await.is_ok());
    }
}
