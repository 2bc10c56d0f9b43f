use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use toolrack_protocol::fallback_tool_schema;

/// Error raised by a tool handler.
///
/// The variant doubles as the error kind recorded in metrics.
#[derive(Debug)]
pub enum ToolError {
    /// The arguments did not match what the tool expects.
    Invalid(String),
    /// The tool itself failed while executing.
    Runtime(String),
}

impl ToolError {
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Invalid(_) => "invalid",
            ToolError::Runtime(_) => "runtime",
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Invalid(msg) => write!(f, "invalid request: {}", msg),
            ToolError::Runtime(msg) => write!(f, "runtime error: {}", msg),
        }
    }
}

impl std::error::Error for ToolError {}

impl From<anyhow::Error> for ToolError {
    fn from(err: anyhow::Error) -> Self {
        ToolError::Runtime(err.to_string())
    }
}

/// Contract for tool handlers.
///
/// Implementations are registered once at startup and shared as `Arc`
/// singletons across requests. `handle` may return loose JSON values; the
/// dispatcher normalises each element into a `ContentItem`.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Symbolic name used to route requests to this handler.
    fn name(&self) -> &str;

    /// One-line human description, used when synthesizing a fallback schema.
    fn description(&self) -> &str {
        ""
    }

    /// JSON schema advertised for this tool.
    fn schema(&self) -> Value {
        fallback_tool_schema(self.name(), self.description())
    }

    async fn handle(&self, arguments: Value) -> Result<Vec<Value>, ToolError>;
}

/// Deserialize tool arguments into a typed request, mapping failures to
/// `ToolError::Invalid`.
pub fn parse_args<T: DeserializeOwned>(arguments: &Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments.clone()).map_err(|err| ToolError::Invalid(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct EchoArgs {
        message: String,
    }

    #[test]
    fn parse_args_maps_failures_to_invalid() {
        let ok: EchoArgs = parse_args(&json!({"message": "hi"})).unwrap();
        assert_eq!(ok.message, "hi");

        let err = parse_args::<EchoArgs>(&json!({"msg": "hi"})).unwrap_err();
        assert_eq!(err.kind(), "invalid");
    }

    struct Named;

    #[async_trait]
    impl ToolHandler for Named {
        fn name(&self) -> &str {
            "named"
        }

        async fn handle(&self, _arguments: Value) -> Result<Vec<Value>, ToolError> {
            Ok(vec![])
        }
    }

    #[test]
    fn default_schema_is_synthesized_from_name() {
        let schema = Named.schema();
        assert_eq!(schema["name"], "named");
        assert_eq!(schema["description"], "Tool: named");
    }
}
