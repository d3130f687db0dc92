//! Method + path routing.
//!
//! Routes are grouped by method and tried in registration order within a
//! method; the first template that matches wins. A literal `/items/new`
//! registered before `/items/:id` therefore shadows it for that one path, and
//! registering them the other way round makes the literal unreachable.

use std::future::Future;

use log::debug;

use crate::parser::{HttpRequest, Method};
use crate::server::error::Error;
use crate::server::handler::{boxed, Route};
use crate::server::path::{PathParams, PathTemplate};
use crate::server::response::HttpResponse;

/// Route table mapping (method, path template) to handlers.
///
/// Built before the server starts and only read afterwards.
#[derive(Clone, Default)]
pub struct Router {
    table: Vec<(Method, Vec<Route>)>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` requests whose path matches `template`.
    pub fn register<F, Fut>(&mut self, method: Method, template: &str, handler: F) -> &mut Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        let route = Route {
            template: PathTemplate::parse(template),
            handler: boxed(handler),
        };

        match self.table.iter_mut().find(|(m, _)| *m == method) {
            Some((_, routes)) => routes.push(route),
            None => self.table.push((method, vec![route])),
        }
        self
    }

    pub fn get<F, Fut>(&mut self, template: &str, handler: F) -> &mut Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        self.register(Method::GET, template, handler)
    }

    pub fn post<F, Fut>(&mut self, template: &str, handler: F) -> &mut Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        self.register(Method::POST, template, handler)
    }

    pub fn put<F, Fut>(&mut self, template: &str, handler: F) -> &mut Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        self.register(Method::PUT, template, handler)
    }

    pub fn delete<F, Fut>(&mut self, template: &str, handler: F) -> &mut Self
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
    {
        self.register(Method::DELETE, template, handler)
    }

    /// Templates registered for `method`, in registration order.
    pub fn routes_for(&self, method: &Method) -> Option<&[Route]> {
        self.table
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, routes)| routes.as_slice())
    }

    /// Every registered (method, route) pair.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &Route)> {
        self.table
            .iter()
            .flat_map(|(method, routes)| routes.iter().map(move |route| (method, route)))
    }

    /// Total number of registered routes.
    pub fn len(&self) -> usize {
        self.table.iter().map(|(_, routes)| routes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the first route for `method` whose template matches `path`.
    pub fn find(&self, method: &Method, path: &str) -> Result<(&Route, PathParams), Error> {
        let routes = self
            .routes_for(method)
            .ok_or_else(|| Error::NoRouteForMethod(method.clone()))?;

        routes
            .iter()
            .find_map(|route| route.template.matches(path).map(|params| (route, params)))
            .ok_or_else(|| Error::NoMatchingRoute(method.clone(), path.to_string()))
    }

    /// Route `request` and run the matched handler to completion.
    ///
    /// Fills `path_params` from the matched template before the handler sees
    /// the request.
    pub async fn dispatch(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        let (route, params) = self.find(request.method(), request.path())?;
        debug!(
            "Connection {id}: {method} {path} matched {template}",
            id = request.connection,
            method = request.method(),
            path = request.path(),
            template = route.template
        );

        request.path_params = params;
        (route.handler)(request).await
    }
}
