use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CoreError, RpcError};

/// Path every JSON-RPC dialect method is POSTed to.
pub const JSON_RPC_PATH: &str = "/json_rpc";
pub const JSON_RPC_VERSION: &str = "2.0";
/// Correlation id sent when the caller does not configure one.
pub const DEFAULT_REQUEST_ID: &str = "0";

// ==============================================================================
// Method Descriptors
// ==============================================================================

/// Which wire shape a remote method speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `{"id","jsonrpc","method","params"}` envelope on [`JSON_RPC_PATH`].
    JsonRpc,
    /// Parameters as the body, result fields flattened at the top level.
    Plain,
}

/// Static description of one remote method: dialect, HTTP path, and name.
///
/// Parameter and result shapes are the type arguments of the dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodDescriptor {
    dialect: Dialect,
    path: &'static str,
    name: &'static str,
}

impl MethodDescriptor {
    pub const fn json_rpc(name: &'static str) -> Self {
        Self {
            dialect: Dialect::JsonRpc,
            path: JSON_RPC_PATH,
            name,
        }
    }

    pub const fn plain(name: &'static str, path: &'static str) -> Self {
        Self {
            dialect: Dialect::Plain,
            path,
            name,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

// ==============================================================================
// Wire Envelopes
// ==============================================================================

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    id: &'a str,
    jsonrpc: &'static str,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(serde::Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// The `{code, message}` error record embedded in response bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct EmbeddedError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// A request ready for the transport. The body dialect always matches `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub method: Method,
    pub path: &'static str,
    pub body: Option<Vec<u8>>,
}

/// A decoded result plus the correlation id echoed by the node (JSON-RPC only).
#[derive(Debug)]
pub(super) struct Decoded<R> {
    pub(super) id: Option<String>,
    pub(super) result: R,
}

// ==============================================================================
// Encoding
// ==============================================================================

/// Serialize `params` into the dialect `descriptor` declares.
///
/// `()` (or anything serializing to `null`) means "no parameters": the
/// JSON-RPC dialect then sends `"params": {}`, and the plain dialect issues a
/// body-less GET.
pub fn encode_request<P>(
    descriptor: &MethodDescriptor,
    request_id: &str,
    params: &P,
) -> Result<RpcRequest, CoreError>
where
    P: Serialize + ?Sized,
{
    let params = serde_json::to_value(params).map_err(|e| {
        CoreError::Decode(format!("encode params for `{}`: {e}", descriptor.name))
    })?;

    match descriptor.dialect {
        Dialect::JsonRpc => {
            let params = if params.is_null() {
                serde_json::Value::Object(serde_json::Map::new())
            } else {
                params
            };
            let envelope = JsonRpcRequest {
                id: request_id,
                jsonrpc: JSON_RPC_VERSION,
                method: descriptor.name,
                params,
            };
            let body = serde_json::to_vec(&envelope).map_err(|e| {
                CoreError::Decode(format!("encode request for `{}`: {e}", descriptor.name))
            })?;
            Ok(RpcRequest {
                method: Method::POST,
                path: descriptor.path,
                body: Some(body),
            })
        }
        Dialect::Plain if params.is_null() => Ok(RpcRequest {
            method: Method::GET,
            path: descriptor.path,
            body: None,
        }),
        Dialect::Plain => {
            let body = serde_json::to_vec(&params).map_err(|e| {
                CoreError::Decode(format!("encode request for `{}`: {e}", descriptor.name))
            })?;
            Ok(RpcRequest {
                method: Method::POST,
                path: descriptor.path,
                body: Some(body),
            })
        }
    }
}

// ==============================================================================
// Decoding
// ==============================================================================

/// Decode a response body for `descriptor`, surfacing embedded errors first.
///
/// The envelope is parsed loosely before the typed result so that a nonzero
/// `error.code` wins even when `result` is present or malformed.
pub(super) fn decode_response<R>(
    descriptor: &MethodDescriptor,
    body: &[u8],
) -> Result<Decoded<R>, CoreError>
where
    R: DeserializeOwned,
{
    match descriptor.dialect {
        Dialect::JsonRpc => decode_json_rpc(descriptor, body),
        Dialect::Plain => decode_plain(descriptor, body),
    }
}

fn decode_json_rpc<R: DeserializeOwned>(
    descriptor: &MethodDescriptor,
    body: &[u8],
) -> Result<Decoded<R>, CoreError> {
    let envelope: JsonRpcResponse = serde_json::from_slice(body).map_err(|e| {
        CoreError::Decode(format!(
            "decode JSON-RPC response for `{}`: {e}",
            descriptor.name
        ))
    })?;

    if let Some(err) = envelope.error {
        check_embedded_error(err)?;
    }

    let result = envelope.result.ok_or_else(|| {
        CoreError::Decode(format!(
            "JSON-RPC response for `{}` has neither result nor error",
            descriptor.name
        ))
    })?;
    let result = serde_json::from_value(result).map_err(|e| {
        CoreError::Decode(format!("invalid `{}` result: {e}", descriptor.name))
    })?;

    Ok(Decoded {
        id: envelope.id.map(|id| match id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        }),
        result,
    })
}

fn decode_plain<R: DeserializeOwned>(
    descriptor: &MethodDescriptor,
    body: &[u8],
) -> Result<Decoded<R>, CoreError> {
    let mut value: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        CoreError::Decode(format!("decode response for `{}`: {e}", descriptor.name))
    })?;

    // The error field is optional on plain endpoints; absence means no error.
    if let Some(err) = value.as_object_mut().and_then(|obj| obj.remove("error")) {
        check_embedded_error(err)?;
    }

    let result = serde_json::from_value(value).map_err(|e| {
        CoreError::Decode(format!("invalid `{}` result: {e}", descriptor.name))
    })?;

    Ok(Decoded { id: None, result })
}

/// Turn an embedded error record into `ServerError` when its code is nonzero.
///
/// `null` and `{"code": 0, ...}` are treated as "no error". Anything that is
/// not a `{code, message}` record is a decode failure.
pub(super) fn check_embedded_error(err: serde_json::Value) -> Result<(), CoreError> {
    if err.is_null() {
        return Ok(());
    }

    let parsed: EmbeddedError = serde_json::from_value(err.clone())
        .map_err(|_| CoreError::Decode(format!("non-standard error record: {err}")))?;

    if parsed.code != 0 {
        return Err(RpcError::ServerError {
            code: parsed.code,
            message: parsed.message,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    const GET_BLOCK_COUNT: MethodDescriptor = MethodDescriptor::json_rpc("get_block_count");
    const GET_HEIGHT: MethodDescriptor = MethodDescriptor::plain("get_height", "/get_height");
    const GET_TRANSACTIONS: MethodDescriptor =
        MethodDescriptor::plain("get_transactions", "/get_transactions");

    #[derive(Debug, Deserialize, PartialEq)]
    struct Count {
        count: u64,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Height {
        height: u64,
        hash: String,
    }

    fn body_json(request: &RpcRequest) -> serde_json::Value {
        serde_json::from_slice(request.body.as_deref().expect("body must be present"))
            .expect("body must be JSON")
    }

    #[test]
    fn json_rpc_request_wraps_params_in_envelope() {
        let request = encode_request(
            &MethodDescriptor::json_rpc("on_get_block_hash"),
            DEFAULT_REQUEST_ID,
            &[912345u64],
        )
        .expect("should encode");

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/json_rpc");
        assert_eq!(
            body_json(&request),
            serde_json::json!({
                "id": "0",
                "jsonrpc": "2.0",
                "method": "on_get_block_hash",
                "params": [912345]
            })
        );
    }

    #[test]
    fn json_rpc_request_without_params_sends_empty_object() {
        let request =
            encode_request(&GET_BLOCK_COUNT, "client-7", &()).expect("should encode");
        assert_eq!(
            body_json(&request),
            serde_json::json!({
                "id": "client-7",
                "jsonrpc": "2.0",
                "method": "get_block_count",
                "params": {}
            })
        );
    }

    #[test]
    fn plain_request_without_params_is_bodyless_get() {
        let request = encode_request(&GET_HEIGHT, DEFAULT_REQUEST_ID, &()).expect("should encode");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/get_height");
        assert!(request.body.is_none());
    }

    #[test]
    fn plain_request_sends_params_verbatim() {
        let params = serde_json::json!({"txs_hashes": ["ab"], "decode_as_json": true});
        let request =
            encode_request(&GET_TRANSACTIONS, DEFAULT_REQUEST_ID, &params).expect("should encode");
        assert_eq!(request.method, Method::POST);
        assert_eq!(body_json(&request), params);
    }

    #[test]
    fn decodes_block_count_fixture() {
        let body = br#"{"id":"0","jsonrpc":"2.0","result":{"count":993163,"status":"OK","untrusted":false}}"#;
        let decoded: Decoded<Count> =
            decode_response(&GET_BLOCK_COUNT, body).expect("should decode");
        assert_eq!(decoded.result, Count { count: 993163 });
        assert_eq!(decoded.id.as_deref(), Some("0"));
    }

    #[test]
    fn nonzero_error_code_wins_over_result() {
        let body = br#"{"id":"0","jsonrpc":"2.0","result":{"count":5},"error":{"code":-2,"message":"Requested block height too big"}}"#;
        let err = decode_response::<Count>(&GET_BLOCK_COUNT, body).expect_err("must fail");
        assert!(matches!(
            err,
            CoreError::Rpc(RpcError::ServerError { code: -2, ref message }) if message == "Requested block height too big"
        ));
    }

    #[test]
    fn error_wins_even_when_result_is_malformed() {
        let body = br#"{"id":"0","jsonrpc":"2.0","result":"garbage","error":{"code":-1,"message":"busy"}}"#;
        let err = decode_response::<Count>(&GET_BLOCK_COUNT, body).expect_err("must fail");
        assert!(matches!(err, CoreError::Rpc(RpcError::ServerError { code: -1, .. })));
    }

    #[test]
    fn zero_error_code_is_success() {
        let body = br#"{"id":"0","jsonrpc":"2.0","result":{"count":1},"error":{"code":0,"message":""}}"#;
        let decoded: Decoded<Count> =
            decode_response(&GET_BLOCK_COUNT, body).expect("should decode");
        assert_eq!(decoded.result.count, 1);
    }

    #[test]
    fn missing_result_and_error_is_decode_error() {
        let body = br#"{"id":"0","jsonrpc":"2.0"}"#;
        let err = decode_response::<Count>(&GET_BLOCK_COUNT, body).expect_err("must fail");
        assert!(matches!(err, CoreError::Decode(_)));
    }

    #[test]
    fn plain_response_without_error_field_decodes() {
        let body = br#"{"hash":"7e23","height":2287217,"status":"OK","untrusted":false}"#;
        let decoded: Decoded<Height> = decode_response(&GET_HEIGHT, body).expect("should decode");
        assert_eq!(decoded.result.height, 2287217);
        assert!(decoded.id.is_none());
    }

    #[test]
    fn plain_response_embedded_error_is_surfaced() {
        let body = br#"{"hash":"","height":0,"error":{"code":-9,"message":"core is busy"}}"#;
        let err = decode_response::<Height>(&GET_HEIGHT, body).expect_err("must fail");
        assert!(matches!(err, CoreError::Rpc(RpcError::ServerError { code: -9, .. })));
    }

    #[test]
    fn non_standard_error_record_is_decode_error() {
        let err = check_embedded_error(serde_json::json!("boom")).expect_err("must fail");
        assert!(matches!(err, CoreError::Decode(_)));
    }

    #[test]
    fn wrong_result_shape_is_decode_error() {
        let body = br#"{"id":"0","jsonrpc":"2.0","result":{"count":"many"}}"#;
        let err = decode_response::<Count>(&GET_BLOCK_COUNT, body).expect_err("must fail");
        assert!(matches!(err, CoreError::Decode(ref msg) if msg.contains("get_block_count")));
    }
}
