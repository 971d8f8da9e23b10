use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, error};

use crate::error::RpcError;
use crate::logging::Logger;
use crate::params::Params;
use crate::request::Request;
use crate::response::{Outcome, Response};
use crate::types::RequestId;

/// Boxed error type for handlers that do not define their own
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Raw handler: sees the whole request and builds the response itself.
///
/// Must return `Some` for calls and `None` for notifications.
pub trait RpcHandler: Send + Sync {
    fn handle(&self, request: &Request) -> Option<Response>;
}

impl<F> RpcHandler for F
where
    F: Fn(&Request) -> Option<Response> + Send + Sync,
{
    fn handle(&self, request: &Request) -> Option<Response> {
        self(request)
    }
}

/// Structured handler: deals with method and params only.
///
/// Wrap it in a [`StructuredHandler`] (or register it with
/// [`Router::register_method`](crate::Router::register_method)) to get response
/// bookkeeping and fault interception.
pub trait MethodHandler: Send + Sync {
    /// The error type returned by this handler; any error is reported to the
    /// caller as a generic "Internal error"
    type Error: fmt::Display + fmt::Debug;

    /// Handle a notification. There is never a response, so the default ignores it.
    fn handle_notification(&self, method: &str, params: Option<&Params>) -> Result<(), Self::Error> {
        let _ = (method, params);
        Ok(())
    }

    /// Handle a call.
    ///
    /// Return `Outcome::Error` for an error the caller should see (with its
    /// code and message) or `Outcome::Result` for success, including a `null`
    /// result. Returning `Err` is treated as an internal fault: it is logged and
    /// the caller gets an "Internal error" without any detail.
    fn handle_request(&self, method: &str, params: Option<&Params>) -> Result<Outcome, Self::Error>;
}

enum Fault {
    Error { summary: String, detail: String },
    Panic(String),
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Adapts a [`MethodHandler`] to the raw [`RpcHandler`] contract.
///
/// - Notifications invoke only `handle_notification` and never yield a response,
///   even when it fails or panics.
/// - Calls invoke `handle_request` and always yield exactly one response carrying
///   the request id.
/// - Errors and panics from either are logged in full; a call then gets
///   `-32603 Internal error` with no data.
///
/// The process panic hook still reports intercepted panics on stderr unless
/// [`install_panic_hook`](crate::logging::install_panic_hook) routes them
/// through the active subscriber.
pub struct StructuredHandler<H> {
    inner: H,
    logger: Logger,
}

impl<H: MethodHandler> StructuredHandler<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            logger: Logger::global(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    fn guarded<T>(&self, f: impl FnOnce() -> Result<T, H::Error>) -> Result<T, Fault> {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(Fault::Error {
                summary: err.to_string(),
                detail: format!("{:?}", err),
            }),
            Err(payload) => Err(Fault::Panic(panic_message(&*payload))),
        }
    }

    fn notify(&self, request: &Request) {
        let outcome =
            self.guarded(|| self.inner.handle_notification(request.method(), request.params()));
        match outcome {
            Ok(()) => debug!(method = %request.method(), "Notification handled"),
            Err(Fault::Error { summary, detail }) => error!(
                method = %request.method(),
                error = %summary,
                details = %detail,
                "Error processing notification"
            ),
            Err(Fault::Panic(message)) => error!(
                method = %request.method(),
                panic = %message,
                "Notification handler panicked"
            ),
        }
    }

    fn call(&self, id: &RequestId, request: &Request) -> Response {
        let outcome =
            self.guarded(|| self.inner.handle_request(request.method(), request.params()));
        match outcome {
            Ok(outcome) => Response::new(id.clone(), outcome),
            Err(fault) => {
                match fault {
                    Fault::Error { summary, detail } => error!(
                        method = %request.method(),
                        id = %id,
                        error = %summary,
                        details = %detail,
                        "Error processing request"
                    ),
                    Fault::Panic(message) => error!(
                        method = %request.method(),
                        id = %id,
                        panic = %message,
                        "Request handler panicked"
                    ),
                }
                Response::error(id.clone(), RpcError::internal_error(None))
            }
        }
    }
}

impl<H: MethodHandler> RpcHandler for StructuredHandler<H> {
    fn handle(&self, request: &Request) -> Option<Response> {
        self.logger.in_scope(|| match request.id() {
            None => {
                self.notify(request);
                None
            }
            Some(id) => Some(self.call(id, request)),
        })
    }
}

type NotificationFn = Box<dyn Fn(&str, Option<&Params>) -> Result<(), BoxError> + Send + Sync>;

/// A structured handler built from closures
pub struct FunctionHandler<F> {
    request_fn: F,
    notification_fn: Option<NotificationFn>,
}

impl<F> FunctionHandler<F>
where
    F: Fn(&str, Option<&Params>) -> Result<Outcome, BoxError> + Send + Sync,
{
    pub fn new(request_fn: F) -> Self {
        Self {
            request_fn,
            notification_fn: None,
        }
    }

    pub fn with_notification_handler<N>(mut self, notification_fn: N) -> Self
    where
        N: Fn(&str, Option<&Params>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.notification_fn = Some(Box::new(notification_fn));
        self
    }
}

impl<F> MethodHandler for FunctionHandler<F>
where
    F: Fn(&str, Option<&Params>) -> Result<Outcome, BoxError> + Send + Sync,
{
    type Error = BoxError;

    fn handle_notification(&self, method: &str, params: Option<&Params>) -> Result<(), BoxError> {
        match &self.notification_fn {
            Some(notification_fn) => notification_fn(method, params),
            None => Ok(()),
        }
    }

    fn handle_request(&self, method: &str, params: Option<&Params>) -> Result<Outcome, BoxError> {
        (self.request_fn)(method, params)
    }
}
