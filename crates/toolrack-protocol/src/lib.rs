use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// JSON-RPC 2.0 error codes used by the enveloped framing.
pub mod rpc_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Service-specific codes (reserved range -32000..-32099).
    pub const NOT_FOUND: i64 = -32001;
    pub const DUPLICATE: i64 = -32002;
    pub const VALIDATION_ERROR: i64 = -32003;
}

/// One element of a tool's result list.
///
/// Handlers may return arbitrary JSON; the dispatcher normalises every
/// element into this shape before it crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".into(),
            text: text.into(),
        }
    }

    /// Normalise a loose handler result element. Objects keep their declared
    /// `type`/`text` fields where present; anything else is stringified as a
    /// text item.
    pub fn normalize(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                let kind = map
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("text")
                    .to_string();
                let text = match map.get("text") {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => Value::Object(map.clone()).to_string(),
                };
                Self { kind, text }
            }
            Value::String(s) => Self::text(s),
            other => Self::text(other.to_string()),
        }
    }
}

/// Best-effort schema for a tool that does not report one of its own.
pub fn fallback_tool_schema(name: &str, description: &str) -> Value {
    let description = if description.is_empty() {
        format!("Tool: {name}")
    } else {
        description.to_string()
    };
    json!({
        "name": name,
        "description": description,
        "inputSchema": {"type": "object", "properties": {}, "required": []},
    })
}

/// JSON-RPC 2.0 request envelope for the enveloped execution framing.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RpcRequest {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Value,
}

fn default_jsonrpc() -> String {
    "2.0".into()
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// JSON-RPC 2.0 response envelope. Exactly one of `result`/`error` is set.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn result(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}
