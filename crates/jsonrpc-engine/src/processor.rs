use std::sync::Arc;

use tracing::{debug, error};

use crate::codec::{JsonCodec, WireCodec};
use crate::error::{CodecError, ContractViolationKind, ProcessError, RpcError, ToRpcError};
use crate::handler::RpcHandler;
use crate::logging::Logger;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::types::RequestId;

/// Error response a transport can send for a payload that failed to decode.
///
/// The reply is addressed to the identifier recovered from the envelope, or to
/// `null` when none could be recovered. Diagnostic text is never included.
pub fn failure_response(err: &CodecError) -> Response {
    let id = err.request_id().cloned().unwrap_or(RequestId::Null);
    Response::error(id, err.to_rpc_error())
}

/// Composition root: decode, dispatch, encode.
///
/// Each call is independent and synchronous; the processor keeps no
/// per-request state, so one instance can serve any number of threads.
pub struct Processor<C = JsonCodec> {
    codec: C,
    handler: Arc<dyn RpcHandler>,
    logger: Logger,
    trace_payloads: bool,
}

impl Processor<JsonCodec> {
    pub fn builder() -> ProcessorBuilder<JsonCodec> {
        ProcessorBuilder::new()
    }
}

impl<C: WireCodec> Processor<C> {
    pub fn new<H>(codec: C, handler: H) -> Self
    where
        H: RpcHandler + 'static,
    {
        Self {
            codec,
            handler: Arc::new(handler),
            logger: Logger::global(),
            trace_payloads: false,
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Process one raw payload.
    ///
    /// Returns `Ok(Some(payload))` for a call, `Ok(None)` for a notification,
    /// `Err(ProcessError::Codec)` when the payload cannot be decoded and
    /// `Err(ProcessError::ContractViolation)` when the handler answered a
    /// notification or failed to answer a call.
    pub fn process(&self, raw: &C::Input) -> Result<Option<C::Output>, ProcessError> {
        self.logger.in_scope(|| {
            let request = self.decode(raw)?;
            match self.process_request(&request)? {
                Some(response) => Ok(Some(self.codec.encode_response(&response)?)),
                None => Ok(None),
            }
        })
    }

    /// Dispatch an already decoded request and check the response contract.
    pub fn process_request(&self, request: &Request) -> Result<Option<Response>, ProcessError> {
        self.logger.in_scope(|| {
            self.dispatch_checked(request)
                .map_err(|kind| ProcessError::ContractViolation {
                    method: request.method().to_string(),
                    kind,
                })
        })
    }

    /// Transport-facing variant of [`Processor::process`] that never fails.
    ///
    /// Undecodable payloads are answered with a parse or invalid-request error.
    /// A call the handler failed to answer gets `-32603 Internal error`, and a
    /// response produced for a notification is discarded; both are logged.
    pub fn handle(&self, raw: &C::Input) -> Option<C::Output> {
        self.logger.in_scope(|| {
            let response = match self.decode(raw) {
                Ok(request) => match self.dispatch_checked(&request) {
                    Ok(response) => response,
                    Err(_) => request
                        .id()
                        .cloned()
                        .map(|id| Response::error(id, RpcError::internal_error(None))),
                },
                Err(err) => Some(failure_response(&err)),
            }?;

            match self.codec.encode_response(&response) {
                Ok(payload) => Some(payload),
                Err(err) => {
                    error!(id = %response.id, error = %err, "Failed to encode response");
                    let fallback = Response::error(response.id, RpcError::internal_error(None));
                    self.codec.encode_response(&fallback).ok()
                }
            }
        })
    }

    fn decode(&self, raw: &C::Input) -> Result<Request, CodecError> {
        let request = self.codec.decode_request(raw).map_err(|err| {
            debug!(error = %err, fragment = ?err.fragment(), "Failed to decode request");
            err
        })?;
        if self.trace_payloads {
            debug!(request = ?request, "Decoded request");
        }
        Ok(request)
    }

    fn dispatch_checked(&self, request: &Request) -> Result<Option<Response>, ContractViolationKind> {
        let response = self.handler.handle(request);
        if self.trace_payloads {
            debug!(method = %request.method(), response = ?response, "Handler returned");
        }

        let violation = match (request.id(), &response) {
            (Some(id), Some(response)) if response.id == *id => None,
            (Some(_), Some(_)) => Some(ContractViolationKind::MismatchedId),
            (Some(_), None) => Some(ContractViolationKind::MissingResponse),
            (None, Some(_)) => Some(ContractViolationKind::UnexpectedResponse),
            (None, None) => None,
        };

        match violation {
            None => Ok(response),
            Some(kind) => {
                error!(
                    method = %request.method(),
                    id = ?request.id(),
                    violation = %kind,
                    "Handler contract violated"
                );
                Err(kind)
            }
        }
    }
}

/// Builder for [`Processor`]
pub struct ProcessorBuilder<C = JsonCodec> {
    codec: C,
    handler: Option<Arc<dyn RpcHandler>>,
    logger: Logger,
    trace_payloads: bool,
}

impl ProcessorBuilder<JsonCodec> {
    pub fn new() -> Self {
        Self {
            codec: JsonCodec::new(),
            handler: None,
            logger: Logger::global(),
            trace_payloads: false,
        }
    }
}

impl Default for ProcessorBuilder<JsonCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: WireCodec> ProcessorBuilder<C> {
    /// Use a different wire codec
    pub fn codec<D: WireCodec>(self, codec: D) -> ProcessorBuilder<D> {
        ProcessorBuilder {
            codec,
            handler: self.handler,
            logger: self.logger,
            trace_payloads: self.trace_payloads,
        }
    }

    pub fn router(self, router: Router) -> Self {
        self.handler(router)
    }

    /// Dispatch to any raw handler instead of a router
    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: RpcHandler + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Log decoded requests and handler responses at debug level
    pub fn trace_payloads(mut self, enabled: bool) -> Self {
        self.trace_payloads = enabled;
        self
    }

    pub fn build(self) -> Processor<C> {
        let handler = match self.handler {
            Some(handler) => handler,
            None => Arc::new(Router::with_logger(self.logger.clone())),
        };
        Processor {
            codec: self.codec,
            handler,
            logger: self.logger,
            trace_payloads: self.trace_payloads,
        }
    }
}
