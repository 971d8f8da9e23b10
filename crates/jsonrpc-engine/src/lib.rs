//! # JSON-RPC 2.0 Message Processing Engine
//!
//! A transport-agnostic JSON-RPC 2.0 core: it decodes a raw payload into a typed
//! request, routes it by method name to application handlers, and encodes the
//! response (or deliberately nothing, for notifications) back into a payload.
//!
//! ## Features
//! - Notification vs. call semantics enforced at the composition root
//! - Positional and named parameters with lazy, type-directed access
//! - Result/error exclusivity by construction
//! - Structured handlers with fault interception (errors and panics)
//! - Pluggable wire codecs (`str`/`String` and `[u8]`/`Vec<u8>` JSON included)
//! - Injectable `tracing` logging
//!
//! ```rust
//! use jsonrpc_engine::prelude::*;
//! use serde_json::json;
//!
//! let mut router = Router::new();
//! router.register_method(
//!     "sum",
//!     FunctionHandler::new(|_method, params| {
//!         let params = params.ok_or("missing params")?;
//!         let a: i64 = params.get(0)?;
//!         let b: i64 = params.get(1)?;
//!         Ok(json!(a + b).into())
//!     }),
//! );
//!
//! let processor = Processor::builder().router(router).build();
//! let reply = processor
//!     .process(r#"{"jsonrpc":"2.0","method":"sum","params":[1,2],"id":7}"#)
//!     .unwrap();
//! assert_eq!(reply.as_deref(), Some(r#"{"jsonrpc":"2.0","id":7,"result":3}"#));
//! ```

pub mod codec;
pub mod error;
pub mod handler;
pub mod logging;
pub mod params;
pub mod prelude;
pub mod processor;
pub mod request;
pub mod response;
pub mod router;
pub mod types;

// Re-export main types
pub use codec::{JsonBytesCodec, JsonCodec, WireCodec};
pub use error::{
    CodecError, ContractViolationKind, ErrorCodeRangeError, JsonRpcErrorCode, ProcessError,
    RpcError, ToRpcError,
};
pub use handler::{BoxError, FunctionHandler, MethodHandler, RpcHandler, StructuredHandler};
pub use logging::{Logger, install_panic_hook};
pub use params::{ParamKey, Params};
pub use processor::{Processor, ProcessorBuilder, failure_response};
pub use request::Request;
pub use response::{Outcome, Response};
pub use router::Router;
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;

    // Whole band reserved for the protocol and framework
    pub const RESERVED_START: i64 = -32768;
    pub const RESERVED_END: i64 = -32000;
}
