//! End-to-end behaviour of the processor: raw payload in, raw payload out.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use jsonrpc_engine::prelude::*;
use jsonrpc_engine::{ContractViolationKind, RpcError};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn logger(&self) -> Logger {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .finish();
        Logger::scoped(tracing::Dispatch::new(subscriber))
    }

    fn contents(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut bytes) = self.0.lock() {
            bytes.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("connection pool exhausted at 10.0.0.7")]
struct PoolExhausted;

#[derive(Default)]
struct AppHandler {
    notifications: AtomicUsize,
}

impl MethodHandler for AppHandler {
    type Error = BoxError;

    fn handle_notification(&self, method: &str, _params: Option<&Params>) -> Result<(), BoxError> {
        self.notifications.fetch_add(1, Ordering::SeqCst);
        match method {
            "log" => Err(Box::new(PoolExhausted)),
            _ => Ok(()),
        }
    }

    fn handle_request(&self, method: &str, params: Option<&Params>) -> Result<Outcome, BoxError> {
        match method {
            "sum" => {
                let params = params.ok_or("missing params")?;
                let a: i64 = params.get(0)?;
                let b: i64 = params.get(1)?;
                Ok(json!(a + b).into())
            }
            "pair" => {
                let params = params.ok_or("missing params")?;
                let a: i64 = params.get("a")?;
                let b: i64 = params.get("b")?;
                Ok(json!([a, b]).into())
            }
            "noop" => Ok(().into()),
            "busy" => Ok(RpcError::server_error(-32001, Some(json!({"retry_after": 5})))?.into()),
            _ => Err(Box::new(PoolExhausted)),
        }
    }
}

fn processor_with(logs: &Captured) -> (Processor, Arc<AtomicUsize>) {
    let mut router = Router::with_logger(logs.logger());
    router.register_methods(
        ["sum", "pair", "noop", "busy", "explode"],
        StructuredHandler::new(AppHandler::default()).with_logger(logs.logger()),
    );
    router.register_method("log", AppHandler::default());

    let counter = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&counter);
    router.register("count", move |request: &Request| {
        seen.fetch_add(1, Ordering::SeqCst);
        Response::reply_to(request, Value::Null)
    });

    let processor = Processor::builder()
        .router(router)
        .logger(logs.logger())
        .build();
    (processor, counter)
}

fn processor() -> Processor {
    processor_with(&Captured::default()).0
}

#[test]
fn sum_call_returns_result() {
    let out = processor()
        .process(r#"{"jsonrpc":"2.0","method":"sum","params":[1,2],"id":7}"#)
        .unwrap();
    assert_eq!(out.as_deref(), Some(r#"{"jsonrpc":"2.0","id":7,"result":3}"#));
}

#[test]
fn unregistered_call_returns_method_not_found() {
    let out = processor()
        .process(r#"{"jsonrpc":"2.0","method":"missing","id":5}"#)
        .unwrap();
    assert_eq!(
        out.as_deref(),
        Some(r#"{"jsonrpc":"2.0","id":5,"error":{"code":-32601,"message":"Method not found"}}"#)
    );
}

#[test]
fn failing_notification_is_logged_not_answered() {
    let logs = Captured::default();
    let (processor, _) = processor_with(&logs);

    let out = processor
        .process(r#"{"jsonrpc":"2.0","method":"log","params":{"x":1}}"#)
        .unwrap();

    assert!(out.is_none());
    let output = logs.contents();
    assert!(output.contains("Error processing notification"));
    assert!(output.contains("connection pool exhausted"));
}

#[test]
fn named_params_by_name_and_wrong_mode() {
    let codec = JsonCodec::new();
    let request = codec
        .decode_request(r#"{"jsonrpc":"2.0","method":"pair","params":{"a":1,"b":2},"id":1}"#)
        .unwrap();
    let params = request.params().unwrap();

    assert_eq!(params.get::<i64, _>("a").unwrap(), 1);
    let err = params.get::<i64, _>(0).unwrap_err();
    assert!(err.is_invalid_params());
    assert_eq!(err.to_rpc_error().code, -32602);
}

#[test]
fn every_call_gets_exactly_one_response_with_its_id() {
    let processor = processor();
    let codec = JsonCodec::new();
    let cases = [
        (json!(1), "sum", json!([1, 2])),
        (json!("abc"), "pair", json!({"a": 1, "b": 2})),
        (json!(null), "noop", json!([])),
        (json!(-4), "busy", json!({})),
        (json!(9), "explode", json!([])),
        (json!(10), "sum", json!({"a": 1})),
        (json!(11), "nobody-home", json!([])),
        (json!("c"), "count", json!([])),
    ];

    for (id, method, params) in cases {
        let raw = json!({"jsonrpc": "2.0", "method": method, "params": params, "id": id});
        let out = processor.process(&raw.to_string()).unwrap().unwrap();
        let response = codec.decode_response(&out).unwrap();

        assert_eq!(response.id.to_value(), id, "id for {}", method);
        assert!(
            response.result().is_some() != response.error_object().is_some(),
            "exactly one of result/error for {}",
            method
        );
    }
}

#[test]
fn notifications_never_get_a_response() {
    let logs = Captured::default();
    let (processor, counter) = processor_with(&logs);

    for method in ["sum", "explode", "log", "count", "nobody-home"] {
        let raw = json!({"jsonrpc": "2.0", "method": method, "params": [1]});
        let out = processor.process(&raw.to_string());
        assert!(matches!(out, Ok(None)), "notification {} answered", method);
    }

    // the raw handler ran but declined to answer
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(logs.contents().contains("Dropping notification for unregistered method"));
}

#[test]
fn internal_errors_do_not_leak_details() {
    let out = processor()
        .process(r#"{"jsonrpc":"2.0","method":"explode","id":3}"#)
        .unwrap()
        .unwrap();
    assert_eq!(
        out,
        r#"{"jsonrpc":"2.0","id":3,"error":{"code":-32603,"message":"Internal error"}}"#
    );
    assert!(!out.contains("10.0.0.7"));
}

#[test]
fn server_error_and_void_result() {
    let processor = processor();
    let out = processor
        .process(r#"{"jsonrpc":"2.0","method":"busy","id":1}"#)
        .unwrap()
        .unwrap();
    assert_eq!(
        out,
        r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32001,"message":"Server error","data":{"retry_after":5}}}"#
    );

    let out = processor
        .process(r#"{"jsonrpc":"2.0","method":"noop","id":2}"#)
        .unwrap()
        .unwrap();
    assert_eq!(out, r#"{"jsonrpc":"2.0","id":2,"result":null}"#);
}

#[test]
fn request_round_trip_preserves_shape() {
    let codec = JsonCodec::new();
    for raw in [
        r#"{"jsonrpc":"2.0","method":"sum","params":[1,2],"id":7}"#,
        r#"{"jsonrpc":"2.0","method":"pair","params":{"a":1,"b":2},"id":"x"}"#,
        r#"{"jsonrpc":"2.0","method":"log","params":{"x":1}}"#,
        r#"{"jsonrpc":"2.0","method":"ping","id":null}"#,
    ] {
        let decoded = codec.decode_request(raw).unwrap();
        let encoded = codec.encode_request(&decoded).unwrap();
        let again = codec.decode_request(&encoded).unwrap();

        assert_eq!(again.method(), decoded.method());
        assert_eq!(again.id(), decoded.id());
        assert_eq!(
            again.params().map(Params::is_positional),
            decoded.params().map(Params::is_positional)
        );
        let original: Value = serde_json::from_str(raw).unwrap();
        let reencoded: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(original, reencoded);
    }
}

#[test]
fn any_numeric_id_is_echoed_unchanged() {
    let processor = processor();
    for id in ["1.5", "18446744073709551615", "-0.25", "1e3"] {
        let raw = format!(r#"{{"jsonrpc":"2.0","method":"noop","id":{}}}"#, id);
        let expected: Value = serde_json::from_str(id).unwrap();

        let out = processor.process(raw.as_str()).unwrap().unwrap();
        let reply: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(reply["id"], expected, "id {}", id);
        assert_eq!(reply["result"], Value::Null);

        let out = processor
            .handle(&format!(r#"{{"jsonrpc":"2.0","method":"nobody-home","id":{}}}"#, id))
            .unwrap();
        let reply: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(reply["id"], expected, "id {}", id);
        assert_eq!(reply["error"]["code"], json!(METHOD_NOT_FOUND));
    }
}

#[test]
fn model_built_requests_round_trip_through_the_codec() {
    let codec = JsonCodec::new();
    assert!(matches!(
        Request::call(1, "", None),
        Err(CodecError::InvalidRequest { .. })
    ));

    let request = Request::call_with_named_params(
        "r-1",
        "pair",
        json!({"a": 1, "b": 2}).as_object().cloned().unwrap(),
    )
    .unwrap();
    let encoded = codec.encode_request(&request).unwrap();
    assert!(encoded.starts_with(r#"{"jsonrpc":"2.0","method":"pair""#));
    assert_eq!(codec.decode_request(&encoded).unwrap(), request);

    let reply = processor().process_request(&request).unwrap().unwrap();
    assert_eq!(reply.result(), Some(&json!([1, 2])));
}

#[test]
fn undecodable_payloads_surface_as_codec_errors() {
    let processor = processor();
    assert!(matches!(
        processor.process("{"),
        Err(ProcessError::Codec(CodecError::Parse { .. }))
    ));
    assert!(matches!(
        processor.process(r#"{"jsonrpc":"2.0","method":"sum","params":7,"id":1}"#),
        Err(ProcessError::Codec(CodecError::InvalidRequest { .. }))
    ));

    let out = processor.handle(r#"{"jsonrpc":"2.0","params":[],"id":8}"#).unwrap();
    assert_eq!(
        out,
        r#"{"jsonrpc":"2.0","id":8,"error":{"code":-32600,"message":"Invalid request"}}"#
    );
}

#[test]
fn misbehaving_raw_handler_is_a_contract_violation() {
    let mut router = Router::new();
    router.register("rude", |_: &Request| Some(Response::null(RequestId::from(1))));
    let processor = Processor::builder().router(router).build();

    let err = processor
        .process(r#"{"jsonrpc":"2.0","method":"rude"}"#)
        .unwrap_err();
    match err {
        ProcessError::ContractViolation { method, kind } => {
            assert_eq!(method, "rude");
            assert_eq!(kind, ContractViolationKind::UnexpectedResponse);
        }
        other => panic!("expected contract violation, got {:?}", other),
    }
}

#[test]
fn processor_is_shareable_across_threads() {
    let processor = Arc::new(processor());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let processor = Arc::clone(&processor);
            std::thread::spawn(move || {
                let raw = json!({"jsonrpc": "2.0", "method": "sum", "params": [i, i], "id": i});
                processor.process(&raw.to_string()).unwrap().unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let out = handle.join().unwrap();
        let expected = format!(r#"{{"jsonrpc":"2.0","id":{},"result":{}}}"#, i, i * 2);
        assert_eq!(out, expected);
    }
}
