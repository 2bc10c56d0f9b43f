use std::sync::Arc;

use tracing::{error, info};

use toolrack_core::{Dispatcher, Observability, ToolRegistry, TracingSink};

mod api_tools;
mod api_widgets;
mod app_state;
mod config;
mod demo;
mod metrics;
mod openapi;
mod router;
mod ui;

pub(crate) use app_state::AppState;

#[tokio::main]
async fn main() {
    toolrack_otel::init();

    let config = match config::ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    let metrics = Arc::new(metrics::Metrics::new());
    let activity = Arc::new(demo::ActivityProvider::new());

    let registry = match ToolRegistry::builder()
        .register(Arc::new(demo::EchoTool::new(activity.clone())))
    {
        Ok(builder) => builder.build(),
        Err(err) => {
            eprintln!("error: tool registration failed: {err}");
            std::process::exit(2);
        }
    };

    let observe = config.observability.then(|| Observability {
        metrics: metrics.clone(),
        trace: Arc::new(TracingSink::new()),
    });
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry), observe));
    let timeline = Arc::new(toolrack_widgets::Timeline::new(config.timeline_capacity));
    let views = Arc::new(toolrack_widgets::ViewRegistry::with_builtin_views());
    let providers: Vec<Arc<dyn toolrack_widgets::WidgetProvider>> = vec![activity];

    let addr = config.addr;
    let state = AppState::new(config, dispatcher, metrics, providers, timeline, views);
    let app = router::build(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind server socket");
    info!(%addr, "toolrack server listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    if let Err(err) = server.await {
        error!("http server exited with error: {err}");
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
}
