//! Metrics and trace sink seams.
//!
//! The dispatcher talks to these traits only; the server wires a
//! Prometheus-style store and a `tracing`-backed span sink, while tests use
//! the recording doubles below to assert on exactly what was emitted.

use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Success,
    Error,
}

impl CallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CallStatus::Success => "success",
            CallStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStatus {
    Ok,
    Error,
}

/// Metrics sink. `on_tool_finish` is called on both the success and the
/// failure path so counters stay accurate when a handler fails.
pub trait MetricsSink: Send + Sync {
    fn on_tool_start(&self, tool: &str);

    fn on_tool_finish(
        &self,
        tool: &str,
        status: CallStatus,
        duration: Duration,
        error: Option<(&str, &str)>,
    );

    fn record_http(
        &self,
        method: &str,
        endpoint: &str,
        status: u16,
        duration: Duration,
        error_kind: Option<&str>,
    );
}

/// Trace sink. Spans nest as a stack; attribute/event/status mutations apply
/// to the innermost open span.
pub trait TraceSink: Send + Sync {
    fn span_start(&self, name: &str, attributes: &[(&str, String)]);
    fn add_attribute(&self, key: &str, value: String);
    fn add_event(&self, name: &str, attributes: &[(&str, String)]);
    fn set_status(&self, status: SpanStatus, description: Option<&str>);
    fn span_end(&self);
}

/// Bundle handed to the dispatcher when observability is enabled.
#[derive(Clone)]
pub struct Observability {
    pub metrics: std::sync::Arc<dyn MetricsSink>,
    pub trace: std::sync::Arc<dyn TraceSink>,
}

/// Production trace sink bridging to the `tracing` crate. Span boundaries and
/// mutations are emitted as structured events under the `toolrack::trace`
/// target; export is whatever subscriber the process installed.
#[derive(Default)]
pub struct TracingSink {
    stack: Mutex<Vec<String>>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&self) -> String {
        self.stack
            .lock()
            .expect("trace stack lock")
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

impl TraceSink for TracingSink {
    fn span_start(&self, name: &str, attributes: &[(&str, String)]) {
        self.stack
            .lock()
            .expect("trace stack lock")
            .push(name.to_string());
        tracing::debug!(target: "toolrack::trace", span = %name, attributes = ?attributes, "span start");
    }

    fn add_attribute(&self, key: &str, value: String) {
        tracing::trace!(target: "toolrack::trace", span = %self.current(), %key, %value, "span attribute");
    }

    fn add_event(&self, name: &str, attributes: &[(&str, String)]) {
        tracing::debug!(target: "toolrack::trace", span = %self.current(), event = %name, attributes = ?attributes, "span event");
    }

    fn set_status(&self, status: SpanStatus, description: Option<&str>) {
        match status {
            SpanStatus::Ok => {
                tracing::debug!(target: "toolrack::trace", span = %self.current(), "span ok")
            }
            SpanStatus::Error => {
                tracing::warn!(target: "toolrack::trace", span = %self.current(), description = description.unwrap_or(""), "span error")
            }
        }
    }

    fn span_end(&self) {
        let name = self.stack.lock().expect("trace stack lock").pop();
        if let Some(name) = name {
            tracing::debug!(target: "toolrack::trace", span = %name, "span end");
        }
    }
}

/// A finished tool-call record captured by [`RecordingMetrics`].
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub tool: String,
    pub status: CallStatus,
    pub duration: Duration,
    pub error_kind: Option<String>,
    pub error_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpRecord {
    pub method: String,
    pub endpoint: String,
    pub status: u16,
    pub duration: Duration,
    pub error_kind: Option<String>,
}

/// Recording metrics double for tests.
#[derive(Default)]
pub struct RecordingMetrics {
    calls: Mutex<Vec<ToolCallRecord>>,
    http: Mutex<Vec<HttpRecord>>,
    active: Mutex<Vec<String>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ToolCallRecord> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn http(&self) -> Vec<HttpRecord> {
        self.http.lock().expect("http lock").clone()
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().expect("active lock").len()
    }
}

impl MetricsSink for RecordingMetrics {
    fn on_tool_start(&self, tool: &str) {
        self.active.lock().expect("active lock").push(tool.into());
    }

    fn on_tool_finish(
        &self,
        tool: &str,
        status: CallStatus,
        duration: Duration,
        error: Option<(&str, &str)>,
    ) {
        let mut active = self.active.lock().expect("active lock");
        if let Some(pos) = active.iter().rposition(|t| t == tool) {
            active.remove(pos);
        }
        drop(active);
        self.calls.lock().expect("calls lock").push(ToolCallRecord {
            tool: tool.into(),
            status,
            duration,
            error_kind: error.map(|(kind, _)| kind.to_string()),
            error_reason: error.map(|(_, reason)| reason.to_string()),
        });
    }

    fn record_http(
        &self,
        method: &str,
        endpoint: &str,
        status: u16,
        duration: Duration,
        error_kind: Option<&str>,
    ) {
        self.http.lock().expect("http lock").push(HttpRecord {
            method: method.into(),
            endpoint: endpoint.into(),
            status,
            duration,
            error_kind: error_kind.map(String::from),
        });
    }
}

/// A finished span captured by [`RecordingTrace`].
#[derive(Debug, Clone)]
pub struct SpanRecord {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub events: Vec<(String, Vec<(String, String)>)>,
    pub status: Option<SpanStatus>,
    pub description: Option<String>,
}

/// Recording trace double for tests. Maintains a real span stack so nesting
/// behaves like the production collector.
#[derive(Default)]
pub struct RecordingTrace {
    open: Mutex<Vec<SpanRecord>>,
    finished: Mutex<Vec<SpanRecord>>,
}

impl RecordingTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finished(&self) -> Vec<SpanRecord> {
        self.finished.lock().expect("finished lock").clone()
    }

    pub fn open_count(&self) -> usize {
        self.open.lock().expect("open lock").len()
    }
}

impl TraceSink for RecordingTrace {
    fn span_start(&self, name: &str, attributes: &[(&str, String)]) {
        self.open.lock().expect("open lock").push(SpanRecord {
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            events: Vec::new(),
            status: None,
            description: None,
        });
    }

    fn add_attribute(&self, key: &str, value: String) {
        if let Some(span) = self.open.lock().expect("open lock").last_mut() {
            span.attributes.push((key.to_string(), value));
        }
    }

    fn add_event(&self, name: &str, attributes: &[(&str, String)]) {
        if let Some(span) = self.open.lock().expect("open lock").last_mut() {
            span.events.push((
                name.to_string(),
                attributes
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            ));
        }
    }

    fn set_status(&self, status: SpanStatus, description: Option<&str>) {
        if let Some(span) = self.open.lock().expect("open lock").last_mut() {
            span.status = Some(status);
            span.description = description.map(String::from);
        }
    }

    fn span_end(&self) {
        let span = self.open.lock().expect("open lock").pop();
        if let Some(span) = span {
            self.finished.lock().expect("finished lock").push(span);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_trace_applies_mutations_to_innermost_span() {
        let trace = RecordingTrace::new();
        trace.span_start("outer", &[]);
        trace.span_start("inner", &[("k", "v".into())]);
        trace.add_event("tick", &[]);
        trace.set_status(SpanStatus::Error, Some("boom"));
        trace.span_end();
        trace.span_end();

        let finished = trace.finished();
        assert_eq!(finished.len(), 2);
        assert_eq!(finished[0].name, "inner");
        assert_eq!(finished[0].events.len(), 1);
        assert_eq!(finished[0].status, Some(SpanStatus::Error));
        assert_eq!(finished[0].description.as_deref(), Some("boom"));
        assert_eq!(finished[1].name, "outer");
        assert!(finished[1].events.is_empty());
        assert_eq!(trace.open_count(), 0);
    }

    #[test]
    fn recording_metrics_tracks_active_calls() {
        let metrics = RecordingMetrics::new();
        metrics.on_tool_start("echo");
        assert_eq!(metrics.active_count(), 1);
        metrics.on_tool_finish("echo", CallStatus::Success, Duration::from_millis(3), None);
        assert_eq!(metrics.active_count(), 0);
        assert_eq!(metrics.calls().len(), 1);
        assert_eq!(metrics.calls()[0].status, CallStatus::Success);
    }
}
