use std::sync::Arc;
use std::time::Instant;

use toolrack_core::Dispatcher;
use toolrack_widgets::{Timeline, ViewRegistry, WidgetProvider};

use crate::config::ServerConfig;
use crate::metrics::Metrics;

/// Shared per-request state. Cheap to clone; everything heavy sits behind an
/// `Arc`.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<Metrics>,
    providers: Arc<Vec<Arc<dyn WidgetProvider>>>,
    timeline: Arc<Timeline>,
    views: Arc<ViewRegistry>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        dispatcher: Arc<Dispatcher>,
        metrics: Arc<Metrics>,
        providers: Vec<Arc<dyn WidgetProvider>>,
        timeline: Arc<Timeline>,
        views: Arc<ViewRegistry>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher,
            metrics,
            providers: Arc::new(providers),
            timeline,
            views,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn providers(&self) -> &[Arc<dyn WidgetProvider>] {
        &self.providers
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    /// Record one HTTP observation unless observability is switched off.
    /// `endpoint` is the route relative to its base path.
    pub fn record_http(
        &self,
        method: &str,
        endpoint: &str,
        status: u16,
        started: Instant,
        error_kind: Option<&str>,
    ) {
        if !self.config.observability {
            return;
        }
        use toolrack_core::MetricsSink;
        self.metrics
            .record_http(method, endpoint, status, started.elapsed(), error_kind);
    }
}
