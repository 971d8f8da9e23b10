use serde_json::Value;

use crate::error::{CodecError, RpcError};
use crate::request::Request;
use crate::types::{JsonRpcVersion, RequestId};

/// Outcome of a call: either a result (possibly `null`) or an error, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Success result; a void method still yields `Result(Value::Null)`
    Result(Value),
    /// Failure reported to the caller
    Error(RpcError),
}

impl Outcome {
    pub fn null() -> Self {
        Outcome::Result(Value::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            Outcome::Result(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RpcError> {
        match self {
            Outcome::Result(_) => None,
            Outcome::Error(error) => Some(error),
        }
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Result(value)
    }
}

impl From<RpcError> for Outcome {
    fn from(error: RpcError) -> Self {
        Outcome::Error(error)
    }
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Outcome::null()
    }
}

impl<T: Into<Outcome>> From<Result<T, RpcError>> for Outcome {
    fn from(result: Result<T, RpcError>) -> Self {
        match result {
            Ok(value) => value.into(),
            Err(error) => Outcome::Error(error),
        }
    }
}

/// A JSON-RPC response to a call.
///
/// Result/error exclusivity is guaranteed by [`Outcome`]; use
/// [`Response::from_parts`] when starting from two optional members.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub version: JsonRpcVersion,
    pub id: RequestId,
    pub outcome: Outcome,
}

impl Response {
    pub fn new(id: RequestId, outcome: impl Into<Outcome>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            id,
            outcome: outcome.into(),
        }
    }

    pub fn success(id: RequestId, result: Value) -> Self {
        Self::new(id, Outcome::Result(result))
    }

    pub fn null(id: RequestId) -> Self {
        Self::new(id, Outcome::null())
    }

    pub fn error(id: RequestId, error: RpcError) -> Self {
        Self::new(id, Outcome::Error(error))
    }

    /// Answer `request` with `outcome`; notifications get no response.
    pub fn reply_to(request: &Request, outcome: impl Into<Outcome>) -> Option<Self> {
        request.id().cloned().map(|id| Self::new(id, outcome))
    }

    /// Build a response from optional `result` and `error` members.
    ///
    /// Exactly one must be present; a void success is `Some(Value::Null)`.
    pub fn from_parts(
        id: RequestId,
        result: Option<Value>,
        error: Option<RpcError>,
    ) -> Result<Self, CodecError> {
        match (result, error) {
            (Some(result), None) => Ok(Self::success(id, result)),
            (None, Some(error)) => Ok(Self::error(id, error)),
            (Some(_), Some(_)) => Err(CodecError::MalformedResponse {
                message: "response may not have both result and error".to_string(),
            }),
            (None, None) => Err(CodecError::MalformedResponse {
                message: "response must have either result or error".to_string(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_error()
    }

    pub fn result(&self) -> Option<&Value> {
        self.outcome.result()
    }

    pub fn error_object(&self) -> Option<&RpcError> {
        self.outcome.error()
    }
}
