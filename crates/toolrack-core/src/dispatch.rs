use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use toolrack_protocol::ContentItem;

use crate::handler::ToolError;
use crate::observe::{CallStatus, Observability, SpanStatus};
use crate::registry::ToolRegistry;

/// Arguments preview attached to the span, capped at this many characters.
const ARGS_PREVIEW_CHARS: usize = 200;
/// Error reason label cap for the errors counter.
const ERROR_REASON_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("tool '{0}' not found")]
    NotFound(String),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("tool execution failed: {0}")]
    Execution(String),
}

impl DispatchError {
    pub fn http_status(&self) -> u16 {
        match self {
            DispatchError::NotFound(_) => 404,
            DispatchError::Validation(_) => 400,
            DispatchError::Execution(_) => 500,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::NotFound(_) => "not_found",
            DispatchError::Validation(_) => "validation_error",
            DispatchError::Execution(_) => "tool_error",
        }
    }
}

/// Resolves symbolic names against the registry and invokes handlers with
/// optional metrics/trace wrapping.
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    observe: Option<Observability>,
    namespace: String,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, observe: Option<Observability>) -> Self {
        Self {
            registry,
            observe,
            namespace: "tool".into(),
        }
    }

    /// Span names are emitted as `<namespace>.<tool>`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn execute(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<Vec<ContentItem>, DispatchError> {
        let handler = self
            .registry
            .get(name)
            .ok_or_else(|| DispatchError::NotFound(name.to_string()))?;

        if let Some(obs) = &self.observe {
            let span_name = format!("{}.{}", self.namespace, name);
            let preview = truncate_chars(&arguments.to_string(), ARGS_PREVIEW_CHARS);
            obs.trace.span_start(
                &span_name,
                &[
                    ("tool.name", name.to_string()),
                    ("tool.arguments", preview),
                ],
            );
            obs.metrics.on_tool_start(name);
        }

        let start = Instant::now();
        let result = handler.handle(arguments).await;
        let duration = start.elapsed();

        match result {
            Ok(items) => {
                if let Some(obs) = &self.observe {
                    obs.metrics
                        .on_tool_finish(name, CallStatus::Success, duration, None);
                    obs.trace.set_status(SpanStatus::Ok, None);
                    obs.trace.span_end();
                }
                Ok(items.into_iter().map(ContentItem::normalize).collect())
            }
            Err(err) => {
                warn!(tool = %name, error = %err, "tool execution failed");
                let reason = truncate_chars(&err.to_string(), ERROR_REASON_CHARS);
                if let Some(obs) = &self.observe {
                    obs.metrics.on_tool_finish(
                        name,
                        CallStatus::Error,
                        duration,
                        Some((err.kind(), &reason)),
                    );
                    obs.trace.set_status(SpanStatus::Error, Some(&err.to_string()));
                    obs.trace.add_event(
                        "exception",
                        &[
                            ("exception.kind", err.kind().to_string()),
                            ("exception.message", err.to_string()),
                        ],
                    );
                    obs.trace.span_end();
                }
                Err(match err {
                    ToolError::Invalid(msg) => DispatchError::Validation(msg),
                    ToolError::Runtime(msg) => DispatchError::Execution(msg),
                })
            }
        }
    }

    /// Schemas for every registered tool, name field force-filled.
    pub fn list(&self) -> Vec<Value> {
        self.registry
            .iter()
            .map(|(name, handler)| named_schema(name, handler.schema()))
            .collect()
    }

    pub fn schema(&self, name: &str) -> Option<Value> {
        self.registry
            .get(name)
            .map(|handler| named_schema(name, handler.schema()))
    }
}

fn named_schema(name: &str, mut schema: Value) -> Value {
    if let Value::Object(map) = &mut schema {
        map.entry("name")
            .or_insert_with(|| Value::String(name.to_string()));
        schema
    } else {
        toolrack_protocol::fallback_tool_schema(name, "")
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}
