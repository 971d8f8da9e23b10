//! Wire codecs: mapping between raw payloads and the message model.
//!
//! Envelope rules live in [`Envelope`] and operate on `serde_json::Value`;
//! a [`WireCodec`] only decides how that value travels (text, bytes). Result,
//! error and parameter bodies go through serde, so any application type with
//! `Serialize`/`Deserialize` impls round-trips without the codec knowing it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CodecError, RpcError};
use crate::params::Params;
use crate::request::Request;
use crate::response::{Outcome, Response};
use crate::types::{JsonRpcVersion, RequestId};

/// Default maximum length (in chars) of diagnostic fragments.
pub const DEFAULT_FRAGMENT_LIMIT: usize = 256;

/// Bidirectional mapping between a wire representation and the message model.
pub trait WireCodec: Send + Sync {
    /// Borrowed form of an incoming payload
    type Input: ?Sized;
    /// Owned form of an outgoing payload
    type Output;

    fn decode_request(&self, raw: &Self::Input) -> Result<Request, CodecError>;

    fn encode_response(&self, response: &Response) -> Result<Self::Output, CodecError>;

    fn encode_request(&self, request: &Request) -> Result<Self::Output, CodecError>;

    fn decode_response(&self, raw: &Self::Input) -> Result<Response, CodecError>;
}

pub(crate) fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub(crate) fn fragment_of(value: &Value, limit: usize) -> String {
    truncate(&value.to_string(), limit)
}

#[derive(Serialize)]
struct RequestEnvelope<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a RequestId>,
}

#[derive(Serialize)]
struct ResponseEnvelope<'a> {
    jsonrpc: &'static str,
    id: &'a RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a RpcError>,
}

/// JSON-RPC 2.0 envelope rules shared by every JSON-based codec.
#[derive(Debug, Clone, Copy)]
pub struct Envelope {
    fragment_limit: usize,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            fragment_limit: DEFAULT_FRAGMENT_LIMIT,
        }
    }
}

impl Envelope {
    pub fn with_fragment_limit(fragment_limit: usize) -> Self {
        Self { fragment_limit }
    }

    pub fn fragment_limit(&self) -> usize {
        self.fragment_limit
    }

    fn parse_error(&self, err: &serde_json::Error, raw: &str) -> CodecError {
        CodecError::Parse {
            message: err.to_string(),
            fragment: truncate(raw, self.fragment_limit),
        }
    }

    fn invalid_request(
        &self,
        message: impl Into<String>,
        value: &Value,
        id: Option<RequestId>,
    ) -> CodecError {
        CodecError::InvalidRequest {
            message: message.into(),
            fragment: fragment_of(value, self.fragment_limit),
            id,
        }
    }

    fn check_version(
        &self,
        obj: &Map<String, Value>,
        value: &Value,
        id: &Option<RequestId>,
    ) -> Result<JsonRpcVersion, CodecError> {
        let message = match obj.get("jsonrpc") {
            Some(Value::String(v)) => match JsonRpcVersion::parse(v) {
                Some(version) => return Ok(version),
                None => format!("unsupported version '{}'", v),
            },
            Some(_) => "version must be a string".to_string(),
            None => "missing 'jsonrpc' member".to_string(),
        };
        Err(self.invalid_request(message, value, id.clone()))
    }

    /// Validate a request envelope.
    pub fn request_from_value(&self, value: Value) -> Result<Request, CodecError> {
        let Some(obj) = value.as_object() else {
            return Err(self.invalid_request("request is not a JSON object", &value, None));
        };

        // Absent id marks a notification; a present but unusable id is invalid.
        let id = match obj.get("id") {
            None => None,
            Some(raw) => match RequestId::from_value(raw) {
                Some(id) => Some(id),
                None => {
                    return Err(self.invalid_request(
                        "id must be a string, a number or null",
                        &value,
                        None,
                    ));
                }
            },
        };

        let version = self.check_version(obj, &value, &id)?;

        let method = match obj.get("method") {
            Some(Value::String(m)) if !m.is_empty() => m.clone(),
            Some(Value::String(_)) => {
                return Err(self.invalid_request("method must not be empty", &value, id));
            }
            Some(_) => return Err(self.invalid_request("method must be a string", &value, id)),
            None => return Err(self.invalid_request("missing 'method' member", &value, id)),
        };

        let params = match obj.get("params") {
            None | Some(Value::Null) => None,
            Some(raw) => match Params::from_value(raw.clone()) {
                Some(params) => Some(params.with_fragment_limit(self.fragment_limit)),
                None => {
                    return Err(self.invalid_request(
                        "params must be an array or an object",
                        &value,
                        id,
                    ));
                }
            },
        };

        Ok(Request::from_envelope(version, method, params, id))
    }

    /// Validate a response envelope.
    pub fn response_from_value(&self, value: Value) -> Result<Response, CodecError> {
        let malformed = |message: &str| CodecError::MalformedResponse {
            message: message.to_string(),
        };
        let obj = value
            .as_object()
            .ok_or_else(|| malformed("response is not a JSON object"))?;

        match obj.get("jsonrpc") {
            Some(Value::String(v)) if JsonRpcVersion::parse(v).is_some() => {}
            _ => return Err(malformed("missing or unsupported 'jsonrpc' member")),
        }

        let id = obj
            .get("id")
            .and_then(RequestId::from_value)
            .ok_or_else(|| malformed("missing or invalid 'id' member"))?;

        let error = match obj.get("error") {
            None => None,
            Some(raw) => Some(
                RpcError::deserialize(raw)
                    .map_err(|e| malformed(&format!("invalid error object: {}", e)))?,
            ),
        };

        Response::from_parts(id, obj.get("result").cloned(), error)
    }

    fn request_envelope<'a>(&self, request: &'a Request) -> RequestEnvelope<'a> {
        RequestEnvelope {
            jsonrpc: request.version().as_str(),
            method: request.method(),
            params: request.params().map(Params::as_value),
            id: request.id(),
        }
    }

    fn response_envelope<'a>(&self, response: &'a Response) -> ResponseEnvelope<'a> {
        let (result, error) = match &response.outcome {
            Outcome::Result(value) => (Some(value), None),
            Outcome::Error(error) => (None, Some(error)),
        };
        ResponseEnvelope {
            jsonrpc: response.version.as_str(),
            id: &response.id,
            result,
            error,
        }
    }
}

/// Text codec: JSON in a `str`, JSON out as a `String`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    envelope: Envelope,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the length of raw fragments recorded in failures.
    pub fn with_fragment_limit(limit: usize) -> Self {
        Self {
            envelope: Envelope::with_fragment_limit(limit),
        }
    }
}

impl WireCodec for JsonCodec {
    type Input = str;
    type Output = String;

    fn decode_request(&self, raw: &str) -> Result<Request, CodecError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| self.envelope.parse_error(&e, raw))?;
        self.envelope.request_from_value(value)
    }

    fn encode_response(&self, response: &Response) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.envelope.response_envelope(response))?)
    }

    fn encode_request(&self, request: &Request) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.envelope.request_envelope(request))?)
    }

    fn decode_response(&self, raw: &str) -> Result<Response, CodecError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| self.envelope.parse_error(&e, raw))?;
        self.envelope.response_from_value(value)
    }
}

/// Byte codec: JSON in a `[u8]`, JSON out as a `Vec<u8>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBytesCodec {
    envelope: Envelope,
}

impl JsonBytesCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fragment_limit(limit: usize) -> Self {
        Self {
            envelope: Envelope::with_fragment_limit(limit),
        }
    }

    fn parse(&self, raw: &[u8]) -> Result<Value, CodecError> {
        serde_json::from_slice(raw)
            .map_err(|e| self.envelope.parse_error(&e, &String::from_utf8_lossy(raw)))
    }
}

impl WireCodec for JsonBytesCodec {
    type Input = [u8];
    type Output = Vec<u8>;

    fn decode_request(&self, raw: &[u8]) -> Result<Request, CodecError> {
        self.envelope.request_from_value(self.parse(raw)?)
    }

    fn encode_response(&self, response: &Response) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(&self.envelope.response_envelope(response))?)
    }

    fn encode_request(&self, request: &Request) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(&self.envelope.request_envelope(request))?)
    }

    fn decode_response(&self, raw: &[u8]) -> Result<Response, CodecError> {
        self.envelope.response_from_value(self.parse(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(raw: &str) -> Result<Request, CodecError> {
        JsonCodec::new().decode_request(raw)
    }

    #[test]
    fn test_decode_call() {
        let request =
            decode(r#"{"jsonrpc":"2.0","method":"sum","params":[1,2],"id":7}"#).unwrap();
        assert_eq!(request.method(), "sum");
        assert_eq!(request.id(), Some(&RequestId::from(7)));
        assert!(request.params().unwrap().is_positional());
    }

    #[test]
    fn test_decode_notification() {
        let request = decode(r#"{"jsonrpc":"2.0","method":"log","params":{"x":1}}"#).unwrap();
        assert!(request.is_notification());
        assert!(!request.params().unwrap().is_positional());
    }

    #[test]
    fn test_null_id_and_null_params() {
        let request = decode(r#"{"jsonrpc":"2.0","method":"m","params":null,"id":null}"#).unwrap();
        assert_eq!(request.id(), Some(&RequestId::Null));
        assert!(request.params().is_none());
    }

    #[test]
    fn test_parse_error() {
        let err = decode(r#"{"jsonrpc": "2.0", "method": "test""#).unwrap_err();
        assert!(matches!(err, CodecError::Parse { .. }));
        assert_eq!(err.fragment(), Some(r#"{"jsonrpc": "2.0", "method": "test""#));
    }

    #[test]
    fn test_invalid_version_recovers_id() {
        let err = decode(r#"{"jsonrpc":"1.0","method":"test","id":1}"#).unwrap_err();
        assert!(matches!(err, CodecError::InvalidRequest { .. }));
        assert_eq!(err.request_id(), Some(&RequestId::from(1)));

        let err = decode(r#"{"method":"test","id":"a"}"#).unwrap_err();
        assert_eq!(err.request_id(), Some(&RequestId::from("a")));
    }

    #[test]
    fn test_invalid_envelopes() {
        for raw in [
            r#"[1,2]"#,
            r#"{"jsonrpc":"2.0","id":1}"#,
            r#"{"jsonrpc":"2.0","method":"","id":1}"#,
            r#"{"jsonrpc":"2.0","method":42,"id":1}"#,
            r#"{"jsonrpc":2.0,"method":"m","id":1}"#,
            r#"{"jsonrpc":"2.0","method":"m","params":3,"id":1}"#,
            r#"{"jsonrpc":"2.0","method":"m","params":"x"}"#,
            r#"{"jsonrpc":"2.0","method":"m","id":true}"#,
            r#"{"jsonrpc":"2.0","method":"m","id":{"a":1}}"#,
        ] {
            let err = decode(raw).unwrap_err();
            assert!(
                matches!(err, CodecError::InvalidRequest { .. }),
                "expected invalid request for {}",
                raw
            );
        }
    }

    #[test]
    fn test_fragment_limit() {
        let codec = JsonCodec::with_fragment_limit(8);
        let err = codec.decode_request("{ this is not json at all").unwrap_err();
        assert_eq!(err.fragment(), Some("{ this i..."));
    }

    #[test]
    fn test_encode_success_and_error() {
        let codec = JsonCodec::new();
        let ok = codec
            .encode_response(&Response::success(RequestId::from(7), json!(3)))
            .unwrap();
        assert_eq!(ok, r#"{"jsonrpc":"2.0","id":7,"result":3}"#);

        let void = codec.encode_response(&Response::null(RequestId::from("x"))).unwrap();
        assert_eq!(void, r#"{"jsonrpc":"2.0","id":"x","result":null}"#);

        let err = codec
            .encode_response(&Response::error(
                RequestId::from(5),
                RpcError::method_not_found(None),
            ))
            .unwrap();
        assert_eq!(
            err,
            r#"{"jsonrpc":"2.0","id":5,"error":{"code":-32601,"message":"Method not found"}}"#
        );
    }

    #[test]
    fn test_request_round_trip() {
        let codec = JsonCodec::new();
        let raw = r#"{"jsonrpc":"2.0","method":"sum","params":{"a":1,"b":[2,3]},"id":"abc"}"#;
        let decoded = codec.decode_request(raw).unwrap();
        let again = codec
            .decode_request(&codec.encode_request(&decoded).unwrap())
            .unwrap();
        assert_eq!(again, decoded);

        let notification = Request::notification("log", None).unwrap();
        let encoded = codec.encode_request(&notification).unwrap();
        assert!(!encoded.contains("\"id\""));
    }

    #[test]
    fn test_encode_request_keeps_envelope_order() {
        let request =
            Request::call_with_positional_params(7, "sum", vec![json!(1), json!(2)]).unwrap();
        assert_eq!(
            JsonCodec::new().encode_request(&request).unwrap(),
            r#"{"jsonrpc":"2.0","method":"sum","params":[1,2],"id":7}"#
        );
        assert_eq!(
            JsonBytesCodec::new().encode_request(&request).unwrap(),
            br#"{"jsonrpc":"2.0","method":"sum","params":[1,2],"id":7}"#.to_vec()
        );

        let notification = Request::notification("log", None).unwrap();
        assert_eq!(
            JsonCodec::new().encode_request(&notification).unwrap(),
            r#"{"jsonrpc":"2.0","method":"log"}"#
        );
    }

    #[test]
    fn test_any_numeric_id_is_kept() {
        for (raw, id) in [
            (r#"{"jsonrpc":"2.0","method":"m","id":1.5}"#, "1.5"),
            (r#"{"jsonrpc":"2.0","method":"m","id":18446744073709551615}"#, "18446744073709551615"),
        ] {
            let request = decode(raw).unwrap();
            assert_eq!(request.id().map(ToString::to_string).as_deref(), Some(id));
            assert_eq!(JsonCodec::new().encode_request(&request).unwrap(), raw);
        }
    }

    #[test]
    fn test_decode_response() {
        let codec = JsonCodec::new();
        let response = codec
            .decode_response(r#"{"jsonrpc":"2.0","id":1,"result":null}"#)
            .unwrap();
        assert_eq!(response.result(), Some(&Value::Null));

        let err = codec
            .decode_response(
                r#"{"jsonrpc":"2.0","id":1,"result":1,"error":{"code":1,"message":"x"}}"#,
            )
            .unwrap_err();
        assert!(matches!(err, CodecError::MalformedResponse { .. }));

        let err = codec.decode_response(r#"{"jsonrpc":"2.0","id":1}"#).unwrap_err();
        assert!(matches!(err, CodecError::MalformedResponse { .. }));
    }

    #[test]
    fn test_bytes_codec() {
        let codec = JsonBytesCodec::new();
        let request = codec
            .decode_request(br#"{"jsonrpc":"2.0","method":"ping","id":2}"#)
            .unwrap();
        assert_eq!(request.id(), Some(&RequestId::from(2)));
        let bytes = codec
            .encode_response(&Response::success(RequestId::from(2), json!("pong")))
            .unwrap();
        assert_eq!(bytes, br#"{"jsonrpc":"2.0","id":2,"result":"pong"}"#.to_vec());
        assert!(matches!(
            codec.decode_request(&[0xff, 0xfe]),
            Err(CodecError::Parse { .. })
        ));
    }
}
