//! In-process metrics store with Prometheus text exposition.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Mutex;
use std::time::Duration;

use toolrack_core::{CallStatus, MetricsSink};

pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

const TOOL_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];
const HTTP_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

#[derive(Clone)]
struct Hist {
    sum: f64,
    count: u64,
    buckets: Vec<u64>,
}

impl Hist {
    fn new(bounds: &[f64]) -> Self {
        Self {
            sum: 0.0,
            count: 0,
            buckets: vec![0; bounds.len()],
        }
    }

    fn observe(&mut self, bounds: &[f64], value: f64) {
        self.sum += value;
        self.count += 1;
        for (i, bound) in bounds.iter().enumerate() {
            if value <= *bound {
                self.buckets[i] += 1;
            }
        }
    }
}

/// Counter/gauge/histogram state behind coarse mutexes. Contention is low:
/// every update is a map lookup plus an integer bump.
#[derive(Default)]
pub struct Metrics {
    tool_requests: Mutex<BTreeMap<(String, String), u64>>,
    tool_duration: Mutex<BTreeMap<(String, String), Hist>>,
    tool_errors: Mutex<BTreeMap<(String, String, String), u64>>,
    tool_active: Mutex<BTreeMap<String, u64>>,
    http_requests: Mutex<BTreeMap<(String, String, u16), u64>>,
    http_duration: Mutex<BTreeMap<(String, String, u16), Hist>>,
    http_errors: Mutex<BTreeMap<(String, String, u16, String), u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();

        out.push_str("# HELP toolrack_tool_requests_total Tool execution requests\n# TYPE toolrack_tool_requests_total counter\n");
        for ((tool, status), count) in self.tool_requests.lock().expect("metrics lock").iter() {
            write_metric_line(
                &mut out,
                "toolrack_tool_requests_total",
                &[("tool", tool.clone()), ("status", status.clone())],
                count,
            );
        }

        out.push_str("# HELP toolrack_tool_request_duration_seconds Tool execution duration\n# TYPE toolrack_tool_request_duration_seconds histogram\n");
        for ((tool, status), hist) in self.tool_duration.lock().expect("metrics lock").iter() {
            write_histogram(
                &mut out,
                "toolrack_tool_request_duration_seconds",
                &[("tool", tool.clone()), ("status", status.clone())],
                TOOL_BUCKETS,
                hist,
            );
        }

        out.push_str("# HELP toolrack_tool_errors_total Tool execution errors by kind\n# TYPE toolrack_tool_errors_total counter\n");
        for ((tool, kind, reason), count) in self.tool_errors.lock().expect("metrics lock").iter()
        {
            write_metric_line(
                &mut out,
                "toolrack_tool_errors_total",
                &[
                    ("tool", tool.clone()),
                    ("kind", kind.clone()),
                    ("reason", reason.clone()),
                ],
                count,
            );
        }

        out.push_str("# HELP toolrack_tool_active_requests Tool executions currently in flight\n# TYPE toolrack_tool_active_requests gauge\n");
        for (tool, active) in self.tool_active.lock().expect("metrics lock").iter() {
            write_metric_line(
                &mut out,
                "toolrack_tool_active_requests",
                &[("tool", tool.clone())],
                active,
            );
        }

        out.push_str("# HELP toolrack_http_requests_total HTTP requests by endpoint\n# TYPE toolrack_http_requests_total counter\n");
        for ((method, endpoint, status), count) in
            self.http_requests.lock().expect("metrics lock").iter()
        {
            write_metric_line(
                &mut out,
                "toolrack_http_requests_total",
                &[
                    ("method", method.clone()),
                    ("endpoint", endpoint.clone()),
                    ("status", status.to_string()),
                ],
                count,
            );
        }

        out.push_str("# HELP toolrack_http_request_duration_seconds HTTP request duration\n# TYPE toolrack_http_request_duration_seconds histogram\n");
        for ((method, endpoint, status), hist) in
            self.http_duration.lock().expect("metrics lock").iter()
        {
            write_histogram(
                &mut out,
                "toolrack_http_request_duration_seconds",
                &[
                    ("method", method.clone()),
                    ("endpoint", endpoint.clone()),
                    ("status", status.to_string()),
                ],
                HTTP_BUCKETS,
                hist,
            );
        }

        out.push_str("# HELP toolrack_http_errors_total HTTP error responses by kind\n# TYPE toolrack_http_errors_total counter\n");
        for ((method, endpoint, status, kind), count) in
            self.http_errors.lock().expect("metrics lock").iter()
        {
            write_metric_line(
                &mut out,
                "toolrack_http_errors_total",
                &[
                    ("method", method.clone()),
                    ("endpoint", endpoint.clone()),
                    ("status", status.to_string()),
                    ("kind", kind.clone()),
                ],
                count,
            );
        }

        out
    }
}

impl MetricsSink for Metrics {
    fn on_tool_start(&self, tool: &str) {
        let mut active = self.tool_active.lock().expect("metrics lock");
        *active.entry(tool.to_string()).or_insert(0) += 1;
    }

    fn on_tool_finish(
        &self,
        tool: &str,
        status: CallStatus,
        duration: Duration,
        error: Option<(&str, &str)>,
    ) {
        {
            let mut active = self.tool_active.lock().expect("metrics lock");
            if let Some(count) = active.get_mut(tool) {
                *count = count.saturating_sub(1);
            }
        }
        let key = (tool.to_string(), status.as_str().to_string());
        *self
            .tool_requests
            .lock()
            .expect("metrics lock")
            .entry(key.clone())
            .or_insert(0) += 1;
        self.tool_duration
            .lock()
            .expect("metrics lock")
            .entry(key)
            .or_insert_with(|| Hist::new(TOOL_BUCKETS))
            .observe(TOOL_BUCKETS, duration.as_secs_f64());
        if let Some((kind, reason)) = error {
            *self
                .tool_errors
                .lock()
                .expect("metrics lock")
                .entry((tool.to_string(), kind.to_string(), reason.to_string()))
                .or_insert(0) += 1;
        }
    }

    fn record_http(
        &self,
        method: &str,
        endpoint: &str,
        status: u16,
        duration: Duration,
        error_kind: Option<&str>,
    ) {
        let key = (method.to_string(), endpoint.to_string(), status);
        *self
            .http_requests
            .lock()
            .expect("metrics lock")
            .entry(key.clone())
            .or_insert(0) += 1;
        self.http_duration
            .lock()
            .expect("metrics lock")
            .entry(key)
            .or_insert_with(|| Hist::new(HTTP_BUCKETS))
            .observe(HTTP_BUCKETS, duration.as_secs_f64());
        if status >= 400 {
            let kind = error_kind.unwrap_or("unknown").to_string();
            *self
                .http_errors
                .lock()
                .expect("metrics lock")
                .entry((method.to_string(), endpoint.to_string(), status, kind))
                .or_insert(0) += 1;
        }
    }
}

fn sanitize_label(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '\n' => ' ',
            '\r' => ' ',
            '"' => '\'',
            _ => c,
        })
        .collect()
}

fn write_metric_line(
    out: &mut String,
    name: &str,
    labels: &[(&str, String)],
    value: impl std::fmt::Display,
) {
    if labels.is_empty() {
        let _ = writeln!(out, "{} {}", name, value);
    } else {
        let rendered_labels: Vec<String> = labels
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, sanitize_label(v)))
            .collect();
        let _ = writeln!(out, "{}{{{}}} {}", name, rendered_labels.join(","), value);
    }
}

fn write_histogram(
    out: &mut String,
    name: &str,
    labels: &[(&str, String)],
    bounds: &[f64],
    hist: &Hist,
) {
    for (bound, count) in bounds.iter().zip(hist.buckets.iter()) {
        let mut bucket_labels = labels.to_vec();
        bucket_labels.push(("le", format!("{}", bound)));
        write_metric_line(out, &format!("{name}_bucket"), &bucket_labels, count);
    }
    let mut inf_labels = labels.to_vec();
    inf_labels.push(("le", "+Inf".to_string()));
    write_metric_line(out, &format!("{name}_bucket"), &inf_labels, hist.count);
    write_metric_line(out, &format!("{name}_sum"), labels, hist.sum);
    write_metric_line(out, &format!("{name}_count"), labels, hist.count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prometheus_export_includes_tool_histogram() {
        let metrics = Metrics::new();
        metrics.on_tool_start("echo");
        metrics.on_tool_finish(
            "echo",
            CallStatus::Success,
            Duration::from_millis(8),
            None,
        );
        metrics.on_tool_start("echo");
        metrics.on_tool_finish(
            "echo",
            CallStatus::Error,
            Duration::from_millis(40),
            Some(("runtime", "boom")),
        );

        let rendered = metrics.render_prometheus();
        assert!(rendered
            .contains("toolrack_tool_requests_total{tool=\"echo\",status=\"success\"} 1"));
        assert!(rendered.contains("toolrack_tool_requests_total{tool=\"echo\",status=\"error\"} 1"));
        assert!(rendered.contains(
            "toolrack_tool_request_duration_seconds_bucket{tool=\"echo\",status=\"success\",le=\"0.01\"} 1"
        ));
        assert!(rendered.contains(
            "toolrack_tool_request_duration_seconds_bucket{tool=\"echo\",status=\"success\",le=\"+Inf\"} 1"
        ));
        assert!(rendered.contains(
            "toolrack_tool_errors_total{tool=\"echo\",kind=\"runtime\",reason=\"boom\"} 1"
        ));
        assert!(rendered.contains("toolrack_tool_active_requests{tool=\"echo\"} 0"));
    }

    #[test]
    fn http_errors_recorded_for_4xx_and_5xx_only() {
        let metrics = Metrics::new();
        metrics.record_http("GET", "/timeline", 200, Duration::from_millis(3), None);
        metrics.record_http(
            "POST",
            "/echo",
            500,
            Duration::from_millis(12),
            Some("tool_error"),
        );
        metrics.record_http("GET", "/missing/schema", 404, Duration::from_millis(1), None);

        let rendered = metrics.render_prometheus();
        assert!(rendered.contains(
            "toolrack_http_requests_total{method=\"GET\",endpoint=\"/timeline\",status=\"200\"} 1"
        ));
        assert!(rendered.contains(
            "toolrack_http_errors_total{method=\"POST\",endpoint=\"/echo\",status=\"500\",kind=\"tool_error\"} 1"
        ));
        assert!(rendered.contains(
            "toolrack_http_errors_total{method=\"GET\",endpoint=\"/missing/schema\",status=\"404\",kind=\"unknown\"} 1"
        ));
        assert!(!rendered.contains("endpoint=\"/timeline\",status=\"200\",kind="));
    }

    #[test]
    fn label_values_are_sanitized() {
        let metrics = Metrics::new();
        metrics.on_tool_start("echo");
        metrics.on_tool_finish(
            "echo",
            CallStatus::Error,
            Duration::from_millis(1),
            Some(("runtime", "line one\nwith \"quotes\"")),
        );
        let rendered = metrics.render_prometheus();
        assert!(rendered.contains("reason=\"line one with 'quotes'\""));
    }
}
