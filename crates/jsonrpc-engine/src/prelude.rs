//! # JSON-RPC Engine Prelude
//!
//! Convenient re-exports of the types most handlers and transports need.
//!
//! ```rust
//! use jsonrpc_engine::prelude::*;
//! ```

pub use crate::codec::{JsonBytesCodec, JsonCodec, WireCodec};
pub use crate::error::{CodecError, ProcessError, RpcError, ToRpcError};
pub use crate::handler::{BoxError, FunctionHandler, MethodHandler, RpcHandler, StructuredHandler};
pub use crate::logging::{Logger, install_panic_hook};
pub use crate::params::Params;
pub use crate::processor::{Processor, failure_response};
pub use crate::request::Request;
pub use crate::response::{Outcome, Response};
pub use crate::router::Router;
pub use crate::types::{JsonRpcVersion, RequestId};

// Standard error codes
pub use crate::error_codes::*;
