//! Simple Calculator JSON-RPC Example
//!
//! Wires a structured calculator handler and a raw handler into a router,
//! then feeds a handful of payloads through the processor the way a transport
//! would: one raw payload in, one raw payload (or nothing) out.

use jsonrpc_engine::prelude::*;
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CalculatorError {
    #[error("missing parameters for {0}")]
    MissingParams(String),
    #[error(transparent)]
    Params(#[from] CodecError),
}

#[derive(Deserialize)]
struct Operands {
    a: f64,
    b: f64,
}

/// Calculator handler that implements basic arithmetic operations
struct CalculatorHandler;

impl MethodHandler for CalculatorHandler {
    type Error = CalculatorError;

    fn handle_notification(&self, method: &str, params: Option<&Params>) -> Result<(), Self::Error> {
        tracing::info!(method, params = ?params.map(Params::as_value), "calculator notification");
        Ok(())
    }

    fn handle_request(&self, method: &str, params: Option<&Params>) -> Result<Outcome, Self::Error> {
        let params = params.ok_or_else(|| CalculatorError::MissingParams(method.to_string()))?;

        // Named params decode as a struct; positional params are read by index.
        let (a, b) = if params.is_positional() {
            (params.get::<f64, _>(0)?, params.get::<f64, _>(1)?)
        } else {
            match params.parse::<Operands>() {
                Ok(Operands { a, b }) => (a, b),
                Err(_) => return Ok(RpcError::invalid_params(Some(json!("expected {a, b}"))).into()),
            }
        };

        let result = match method {
            "add" => a + b,
            "subtract" => a - b,
            "divide" if b == 0.0 => {
                return Ok(RpcError::application(1, "Division by zero", None)
                    .unwrap_or_else(|_| RpcError::internal_error(None))
                    .into());
            }
            "divide" => a / b,
            _ => return Ok(RpcError::method_not_found(None).into()),
        };
        Ok(json!(result).into())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let mut router = Router::new();
    router.register_methods(
        ["add", "subtract", "divide"],
        StructuredHandler::new(CalculatorHandler),
    );
    router.register("version", |request: &Request| {
        Response::reply_to(request, json!(env!("CARGO_PKG_VERSION")))
    });

    let processor = Processor::builder().router(router).trace_payloads(true).build();

    let payloads = [
        r#"{"jsonrpc": "2.0", "method": "add", "params": {"a": 5, "b": 3}, "id": 1}"#,
        r#"{"jsonrpc": "2.0", "method": "subtract", "params": [10, 4], "id": 2}"#,
        r#"{"jsonrpc": "2.0", "method": "divide", "params": [1, 0], "id": 3}"#,
        r#"{"jsonrpc": "2.0", "method": "multiply", "params": [2, 3], "id": 4}"#,
        r#"{"jsonrpc": "2.0", "method": "add", "params": {"a": "invalid", "b": 5}, "id": 5}"#,
        r#"{"jsonrpc": "2.0", "method": "add", "params": ["invalid", 5], "id": 6}"#,
        r#"{"jsonrpc": "2.0", "method": "version", "id": "v"}"#,
        r#"{"jsonrpc": "2.0", "method": "add", "params": [1, 1]}"#,
        r#"{"jsonrpc": "2.0", "method": "add", "params": [1, 1"#,
    ];

    for (i, payload) in payloads.iter().enumerate() {
        println!("\n--- Payload {} ---", i + 1);
        println!("Request:  {}", payload);
        match processor.handle(payload) {
            Some(reply) => println!("Response: {}", reply),
            None => println!("Response: (none, notification)"),
        }
    }
}
