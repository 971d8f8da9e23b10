use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::RpcError;
use crate::handler::{MethodHandler, RpcHandler, StructuredHandler};
use crate::logging::Logger;
use crate::request::Request;
use crate::response::Response;

/// Method-name router.
///
/// Registration happens during setup; afterwards the registry is only read, so
/// a built router can be shared across threads without locking. Lookup is an
/// exact string match on the method name.
///
/// Unregistered methods go to the fallback handler when one is set. Otherwise
/// calls are answered with `-32601 Method not found` and notifications are
/// dropped with a warning.
pub struct Router {
    handlers: HashMap<String, Arc<dyn RpcHandler>>,
    fallback: Option<Arc<dyn RpcHandler>>,
    logger: Logger,
}

impl Router {
    pub fn new() -> Self {
        Self::with_logger(Logger::global())
    }

    /// Router whose own events, and those of structured handlers registered
    /// through [`Router::register_method`], go to `logger`.
    pub fn with_logger(logger: Logger) -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: None,
            logger,
        }
    }

    /// Bind `method` to a raw handler. A later registration for the same name
    /// replaces the earlier one.
    pub fn register<H>(&mut self, method: impl Into<String>, handler: H) -> &mut Self
    where
        H: RpcHandler + 'static,
    {
        self.insert(method.into(), Arc::new(handler));
        self
    }

    /// Bind `method` to a structured handler
    pub fn register_method<H>(&mut self, method: impl Into<String>, handler: H) -> &mut Self
    where
        H: MethodHandler + 'static,
    {
        let handler = StructuredHandler::new(handler).with_logger(self.logger.clone());
        self.register(method, handler)
    }

    /// Bind several method names to one shared raw handler
    pub fn register_methods<H, I, S>(&mut self, methods: I, handler: H) -> &mut Self
    where
        H: RpcHandler + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handler: Arc<dyn RpcHandler> = Arc::new(handler);
        for method in methods {
            self.insert(method.into(), Arc::clone(&handler));
        }
        self
    }

    /// Handler consulted for methods with no binding of their own
    pub fn set_fallback<H>(&mut self, handler: H) -> &mut Self
    where
        H: RpcHandler + 'static,
    {
        self.fallback = Some(Arc::new(handler));
        self
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// All registered method names, sorted
    pub fn registered_methods(&self) -> Vec<String> {
        let mut methods: Vec<String> = self.handlers.keys().cloned().collect();
        methods.sort();
        methods
    }

    /// Route `request` to its handler.
    pub fn dispatch(&self, request: &Request) -> Option<Response> {
        self.logger.in_scope(|| {
            let handler = self
                .handlers
                .get(request.method())
                .or(self.fallback.as_ref());

            match (handler, request.id()) {
                (Some(handler), _) => handler.handle(request),
                (None, Some(id)) => {
                    debug!(method = %request.method(), id = %id, "Method not found");
                    Some(Response::error(id.clone(), RpcError::method_not_found(None)))
                }
                (None, None) => {
                    warn!(
                        method = %request.method(),
                        "Dropping notification for unregistered method"
                    );
                    None
                }
            }
        })
    }

    fn insert(&mut self, method: String, handler: Arc<dyn RpcHandler>) {
        if self.handlers.insert(method.clone(), handler).is_some() {
            debug!(method = %method, "Replaced existing handler");
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcHandler for Router {
    fn handle(&self, request: &Request) -> Option<Response> {
        self.dispatch(request)
    }
}
