use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::error_codes;
use crate::types::RequestId;

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerError(i64), // -32099 to -32000
    Application(i64),
}

impl JsonRpcErrorCode {
    /// Classify a numeric code.
    pub fn from_code(code: i64) -> Self {
        match code {
            error_codes::PARSE_ERROR => JsonRpcErrorCode::ParseError,
            error_codes::INVALID_REQUEST => JsonRpcErrorCode::InvalidRequest,
            error_codes::METHOD_NOT_FOUND => JsonRpcErrorCode::MethodNotFound,
            error_codes::INVALID_PARAMS => JsonRpcErrorCode::InvalidParams,
            error_codes::INTERNAL_ERROR => JsonRpcErrorCode::InternalError,
            c if is_server_error_code(c) => JsonRpcErrorCode::ServerError(c),
            c => JsonRpcErrorCode::Application(c),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            JsonRpcErrorCode::ServerError(code) => *code,
            JsonRpcErrorCode::Application(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal error",
            JsonRpcErrorCode::ServerError(_) => "Server error",
            JsonRpcErrorCode::Application(_) => "Application error",
        }
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Whether `code` lies in the band reserved for the protocol and framework.
pub fn is_reserved_code(code: i64) -> bool {
    (error_codes::RESERVED_START..=error_codes::RESERVED_END).contains(&code)
}

/// Whether `code` lies in the implementer-defined server error sub-range.
pub fn is_server_error_code(code: i64) -> bool {
    (error_codes::SERVER_ERROR_START..=error_codes::SERVER_ERROR_END).contains(&code)
}

/// Rejected attempt to build an error object with a code outside its allowed band.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorCodeRangeError {
    #[error("server error code {0} is outside -32099..=-32000")]
    NotServerError(i64),
    #[error("application error code {0} falls inside the reserved band -32768..=-32000")]
    Reserved(i64),
}

/// The `error` member of a JSON-RPC response.
///
/// Factory methods produce the protocol-defined errors. Applications should pick
/// their own codes outside the reserved band; non-negative codes are always safe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    fn standard(code: JsonRpcErrorCode, data: Option<Value>) -> Self {
        Self {
            code: code.code(),
            message: code.message().to_string(),
            data,
        }
    }

    pub fn parse_error(data: Option<Value>) -> Self {
        Self::standard(JsonRpcErrorCode::ParseError, data)
    }

    pub fn invalid_request(data: Option<Value>) -> Self {
        Self::standard(JsonRpcErrorCode::InvalidRequest, data)
    }

    pub fn method_not_found(data: Option<Value>) -> Self {
        Self::standard(JsonRpcErrorCode::MethodNotFound, data)
    }

    pub fn invalid_params(data: Option<Value>) -> Self {
        Self::standard(JsonRpcErrorCode::InvalidParams, data)
    }

    pub fn internal_error(data: Option<Value>) -> Self {
        Self::standard(JsonRpcErrorCode::InternalError, data)
    }

    /// "Server error" with an implementer-defined code in -32099..=-32000.
    pub fn server_error(code: i64, data: Option<Value>) -> Result<Self, ErrorCodeRangeError> {
        if !is_server_error_code(code) {
            return Err(ErrorCodeRangeError::NotServerError(code));
        }
        Ok(Self::standard(JsonRpcErrorCode::ServerError(code), data))
    }

    /// Application-defined error; the code must stay clear of the reserved band.
    pub fn application(
        code: i64,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Result<Self, ErrorCodeRangeError> {
        if is_reserved_code(code) {
            return Err(ErrorCodeRangeError::Reserved(code));
        }
        Ok(Self {
            code,
            message: message.into(),
            data,
        })
    }

    pub fn kind(&self) -> JsonRpcErrorCode {
        JsonRpcErrorCode::from_code(self.code)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC Error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

/// Failures produced while decoding or encoding messages, or while extracting
/// parameters. The `fragment` is for operators only and never reaches the wire.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("parse error: {message}")]
    Parse { message: String, fragment: String },

    #[error("invalid request: {message}")]
    InvalidRequest {
        message: String,
        fragment: String,
        id: Option<RequestId>,
    },

    #[error("invalid params: {message}")]
    InvalidParams { message: String, fragment: String },

    #[error("malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CodecError {
    /// Raw text that triggered the failure, if any.
    pub fn fragment(&self) -> Option<&str> {
        match self {
            CodecError::Parse { fragment, .. }
            | CodecError::InvalidRequest { fragment, .. }
            | CodecError::InvalidParams { fragment, .. } => Some(fragment),
            _ => None,
        }
    }

    /// Identifier recovered from an otherwise invalid envelope.
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            CodecError::InvalidRequest { id, .. } => id.as_ref(),
            _ => None,
        }
    }

    pub fn is_invalid_params(&self) -> bool {
        matches!(self, CodecError::InvalidParams { .. })
    }
}

/// Trait for failures that can be reported to a caller as a JSON-RPC error object
pub trait ToRpcError: std::error::Error + Send + Sync + 'static {
    /// Convert this failure to a JSON-RPC error object
    fn to_rpc_error(&self) -> RpcError;
}

impl ToRpcError for CodecError {
    fn to_rpc_error(&self) -> RpcError {
        match self {
            CodecError::Parse { .. } => RpcError::parse_error(None),
            CodecError::InvalidRequest { .. } => RpcError::invalid_request(None),
            CodecError::InvalidParams { .. } => RpcError::invalid_params(None),
            CodecError::MalformedResponse { .. } | CodecError::Serialization(_) => {
                RpcError::internal_error(None)
            }
        }
    }
}

impl ToRpcError for RpcError {
    fn to_rpc_error(&self) -> RpcError {
        self.clone()
    }
}

/// How a handler broke the call/notification response contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractViolationKind {
    /// A call produced no response.
    MissingResponse,
    /// A notification produced a response.
    UnexpectedResponse,
    /// A call produced a response addressed to another identifier.
    MismatchedId,
}

impl fmt::Display for ContractViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContractViolationKind::MissingResponse => "call produced no response",
            ContractViolationKind::UnexpectedResponse => "notification produced a response",
            ContractViolationKind::MismatchedId => "response id does not match request id",
        })
    }
}

/// Errors surfaced by the processor to the transport.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The payload could not be decoded into a request
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A handler did not honour the response/no-response contract
    #[error("handler contract violated for method '{method}': {kind}")]
    ContractViolation {
        method: String,
        kind: ContractViolationKind,
    },
}
