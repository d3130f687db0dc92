//! HTTP request handlers and route entries.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::parser::HttpRequest;
use crate::server::path::PathTemplate;
use crate::server::{HttpResponse, Error};

/// Type alias for a boxed future that returns a Result<HttpResponse, Error>.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>;

/// Type alias for a handler function that takes an HttpRequest and returns a HandlerFuture.
pub type HandlerFn = Arc<dyn Fn(HttpRequest) -> HandlerFuture + Send + Sync>;

/// Erase a concrete async handler into a [`HandlerFn`].
pub(crate) fn boxed<F, Fut>(handler: F) -> HandlerFn
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
{
    Arc::new(move |req: HttpRequest| -> HandlerFuture { Box::pin(handler(req)) })
}

/// A template registered under one method, with the handler it dispatches to.
#[derive(Clone)]
pub struct Route {
    /// The path template to match.
    pub template: PathTemplate,
    /// The handler function.
    pub handler: HandlerFn,
}
