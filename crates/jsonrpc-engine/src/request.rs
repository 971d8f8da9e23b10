use serde_json::{Map, Value};

use crate::error::CodecError;
use crate::params::Params;
use crate::types::{JsonRpcVersion, RequestId};

/// A decoded JSON-RPC request.
///
/// A request carrying an identifier is a call and must be answered with exactly
/// one response; one without is a notification and must never be answered.
///
/// Fields are read through accessors so the method name can never be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    version: JsonRpcVersion,
    method: String,
    params: Option<Params>,
    id: Option<RequestId>,
}

impl Request {
    /// Build a request; `id` decides between call (`Some`) and notification (`None`).
    pub fn new(
        id: Option<RequestId>,
        method: impl Into<String>,
        params: Option<Params>,
    ) -> Result<Self, CodecError> {
        let method = method.into();
        if method.is_empty() {
            return Err(CodecError::InvalidRequest {
                message: "method must not be empty".to_string(),
                fragment: String::new(),
                id,
            });
        }
        Ok(Self::from_envelope(JsonRpcVersion::V2_0, method, params, id))
    }

    /// Assemble a request whose envelope has already been validated.
    pub(crate) fn from_envelope(
        version: JsonRpcVersion,
        method: String,
        params: Option<Params>,
        id: Option<RequestId>,
    ) -> Self {
        Self {
            version,
            method,
            params,
            id,
        }
    }

    /// Create a call (a request expecting a response)
    pub fn call(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: Option<Params>,
    ) -> Result<Self, CodecError> {
        Self::new(Some(id.into()), method, params)
    }

    /// Create a notification (no id, no response)
    pub fn notification(
        method: impl Into<String>,
        params: Option<Params>,
    ) -> Result<Self, CodecError> {
        Self::new(None, method, params)
    }

    /// Create a call with named parameters
    pub fn call_with_named_params(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: Map<String, Value>,
    ) -> Result<Self, CodecError> {
        Self::call(id, method, Some(Params::named(params)))
    }

    /// Create a call with positional parameters
    pub fn call_with_positional_params(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: Vec<Value>,
    ) -> Result<Self, CodecError> {
        Self::call(id, method, Some(Params::positional(params)))
    }

    pub fn version(&self) -> JsonRpcVersion {
        self.version
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }

    pub fn id(&self) -> Option<&RequestId> {
        self.id.as_ref()
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_call(&self) -> bool {
        self.id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_and_notification() {
        let call = Request::call(1, "ping", None).unwrap();
        assert!(call.is_call());
        assert_eq!(call.id(), Some(&RequestId::from(1)));
        assert_eq!(call.method(), "ping");

        let notification = Request::notification("log", None).unwrap();
        assert!(notification.is_notification());
        assert_eq!(notification.version(), JsonRpcVersion::V2_0);
    }

    #[test]
    fn test_null_id_is_still_a_call() {
        let call = Request::call(RequestId::Null, "ping", None).unwrap();
        assert!(call.is_call());
    }

    #[test]
    fn test_empty_method_is_rejected() {
        let err = Request::call(4, "", None).unwrap_err();
        assert!(matches!(err, CodecError::InvalidRequest { .. }));
        assert_eq!(err.request_id(), Some(&RequestId::from(4)));

        assert!(Request::notification("", None).is_err());
        assert!(Request::call_with_positional_params("a", "", vec![]).is_err());
    }

    #[test]
    fn test_request_with_positional_params() {
        let request =
            Request::call_with_positional_params("req1", "process", vec![json!("test"), json!(42)])
                .unwrap();
        let params = request.params().unwrap();
        assert!(params.is_positional());
        assert_eq!(params.get::<u32, _>(1).unwrap(), 42);
    }
}
