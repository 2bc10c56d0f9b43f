//! Tracing subscriber setup for toolrack services.
//!
//! Console logging by default, filtered through `RUST_LOG` (falling back to
//! `info`). With the `otlp` feature compiled in and `TOOLRACK_OTEL=1` set,
//! spans are additionally exported over OTLP/gRPC.

use tracing_subscriber::{
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(feature = "otlp")]
    {
        if std::env::var("TOOLRACK_OTEL").as_deref() == Ok("1") {
            match init_with_otlp(filter.clone()) {
                Ok(()) => return,
                Err(err) => {
                    tracing::warn!(
                        %err,
                        "failed to initialise OTLP exporter; falling back to console tracing"
                    );
                }
            }
        }
    }

    install_console(filter);
}

fn install_console(filter: EnvFilter) {
    let fmt_layer = fmt::layer();
    let registry = tracing_subscriber::registry().with(fmt_layer.with_filter(filter));
    let _ = registry.try_init();
}

#[cfg(feature = "otlp")]
fn init_with_otlp(filter: EnvFilter) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::{global, KeyValue};
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::propagation::TraceContextPropagator;
    use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};

    let endpoint = std::env::var("TOOLRACK_OTEL_ENDPOINT")
        .unwrap_or_else(|_| "http://127.0.0.1:4317".to_string());
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .build()?;

    let service_name =
        std::env::var("TOOLRACK_OTEL_SERVICE_NAME").unwrap_or_else(|_| "toolrack-server".into());
    let resource = Resource::builder()
        .with_attributes(vec![
            KeyValue::new("service.name", service_name),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            KeyValue::new(
                "service.instance.id",
                format!("pid-{}", std::process::id()),
            ),
        ])
        .build();

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build();
    let tracer = provider.tracer("toolrack");
    global::set_tracer_provider(provider);
    global::set_text_map_propagator(TraceContextPropagator::new());

    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
    let fmt_layer = fmt::layer();
    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .with(otel_layer)
        .try_init()?;

    tracing::info!(endpoint, "OTLP tracing exporter initialised");
    Ok(())
}
