use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::{api_tools, api_widgets, openapi, AppState};

pub fn build(state: AppState) -> Router {
    let tools = Router::new()
        .route("/", get(api_tools::list_tools))
        .route("/metrics", get(api_tools::metrics_prometheus))
        .route("/{tool_name}", post(api_tools::execute_simple))
        .route("/{tool_name}/schema", get(api_tools::tool_schema))
        .route("/{tool_name}/sse", post(api_tools::execute_sse))
        .route("/{tool_name}/jsonrpc", post(api_tools::execute_jsonrpc));

    let widgets = Router::new()
        .route("/ui", get(api_widgets::widget_ui))
        .route("/render", post(api_widgets::render_widgets))
        .route("/timeline", get(api_widgets::get_timeline))
        .route("/create", post(api_widgets::create_widget))
        .route("/action/{widget_id}", post(api_widgets::widget_action));

    Router::new()
        .route("/", get(api_widgets::root_ui))
        .route("/spec/openapi.json", get(openapi::openapi_json))
        .nest(&state.config().tools_base, tools)
        .nest(&state.config().widgets_base, widgets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::demo::{ActivityProvider, EchoTool};
    use crate::metrics::Metrics;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use toolrack_core::{Dispatcher, Observability, ToolRegistry, TracingSink};
    use toolrack_widgets::{Timeline, ViewRegistry, WidgetProvider};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let config = ServerConfig::default();
        let metrics = Arc::new(Metrics::new());
        let activity = Arc::new(ActivityProvider::new());
        let registry = ToolRegistry::builder()
            .register(Arc::new(EchoTool::new(activity.clone())))
            .expect("register echo")
            .build();
        let observe = Observability {
            metrics: metrics.clone(),
            trace: Arc::new(TracingSink::new()),
        };
        let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry), Some(observe)));
        let providers: Vec<Arc<dyn WidgetProvider>> = vec![activity];
        AppState::new(
            config,
            dispatcher,
            metrics,
            providers,
            Arc::new(Timeline::default()),
            Arc::new(ViewRegistry::with_builtin_views()),
        )
    }

    fn test_app() -> Router {
        build(test_state())
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn list_tools_exposes_echo() {
        let app = test_app();
        let response = app
            .oneshot(Request::get("/v1/tools").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["tools"][0]["name"], "echo");
        assert!(body["tools"][0]["inputSchema"]["properties"]["message"].is_object());
    }

    #[tokio::test]
    async fn schema_for_unknown_tool_is_404() {
        let app = test_app();
        let response = app
            .oneshot(
                Request::get("/v1/tools/missing/schema")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn simple_execution_returns_result_items() {
        let app = test_app();
        let response = app
            .oneshot(post_json(
                "/v1/tools/echo",
                json!({ "arguments": { "message": "hi" } }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["result"][0]["type"], "text");
        assert_eq!(body["result"][0]["text"], "Echo: hi");
    }

    #[tokio::test]
    async fn invalid_arguments_are_a_400() {
        let app = test_app();
        let response = app
            .oneshot(post_json("/v1/tools/echo", json!({ "arguments": {} })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("invalid request"));
    }

    #[tokio::test]
    async fn sse_stream_frames_items_and_done() {
        let app = test_app();
        let response = app
            .oneshot(post_json(
                "/v1/tools/echo/sse",
                json!({ "arguments": { "message": "hi" } }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));
        let body = body_text(response).await;
        assert!(body.contains("data: {\"type\":\"text\",\"text\":\"Echo: hi\"}"));
        assert!(body.ends_with("data: [DONE]\n\n"));
    }

    #[tokio::test]
    async fn sse_errors_are_in_band_without_done() {
        let app = test_app();
        let response = app
            .oneshot(post_json("/v1/tools/echo/sse", json!({ "arguments": {} })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("\"error\""));
        assert!(!body.contains("[DONE]"));
    }

    #[tokio::test]
    async fn jsonrpc_success_carries_request_id() {
        let app = test_app();
        let response = app
            .oneshot(post_json(
                "/v1/tools/echo/jsonrpc",
                json!({ "jsonrpc": "2.0", "id": 7, "method": "echo", "params": { "message": "hi" } }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], 7);
        assert_eq!(body["result"][0]["text"], "Echo: hi");
    }

    #[tokio::test]
    async fn jsonrpc_method_mismatch_is_a_400() {
        let app = test_app();
        let response = app
            .oneshot(post_json(
                "/v1/tools/echo/jsonrpc",
                json!({ "jsonrpc": "2.0", "id": 1, "method": "other", "params": {} }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn jsonrpc_failure_returns_error_object_on_200() {
        let app = test_app();
        let response = app
            .oneshot(post_json(
                "/v1/tools/echo/jsonrpc",
                json!({ "jsonrpc": "2.0", "id": 2, "method": "echo", "params": {} }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], 2);
        assert!(body["error"]["code"].is_i64());
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("invalid request"));
    }

    #[tokio::test]
    async fn timeline_reflects_created_widgets_and_actions() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/v1/widgets/create",
                json!({ "widget": {
                    "title": "Deploy finished",
                    "service_name": "ci",
                    "actions": [{ "label": "Rerun", "url": "/v1/tools/echo" }]
                }}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let created = body_json(response).await;
        let widget_id = created["widget"]["id"].as_str().unwrap().to_string();
        assert!(!widget_id.is_empty());

        let response = app
            .clone()
            .oneshot(
                Request::get("/v1/widgets/timeline?limit=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["widgets"][0]["title"], "Deploy finished");

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("/v1/widgets/action/{widget_id}"),
                json!({ "action_index": 0 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["action"]["method"], "POST");
        assert_eq!(body["action"]["url"], "/v1/tools/echo");

        let response = app
            .oneshot(post_json(
                &format!("/v1/widgets/action/{widget_id}"),
                json!({ "action_index": 5 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn action_on_unknown_widget_is_404() {
        let app = test_app();
        let response = app
            .oneshot(post_json(
                "/v1/widgets/action/nope",
                json!({ "action_index": 0 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn timeline_rejects_bad_since() {
        let app = test_app();
        let response = app
            .oneshot(
                Request::get("/v1/widgets/timeline?since=yesterday")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn echo_execution_lands_on_the_timeline() {
        let app = test_app();
        app.clone()
            .oneshot(post_json(
                "/v1/tools/echo",
                json!({ "arguments": { "message": "hi" } }),
            ))
            .await
            .unwrap();
        let response = app
            .oneshot(
                Request::get("/v1/widgets/timeline?limit=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["widgets"][0]["tool_name"], "echo");
    }

    #[tokio::test]
    async fn render_endpoint_returns_html_for_cards() {
        let app = test_app();
        let response = app
            .oneshot(post_json(
                "/v1/widgets/render",
                json!({
                    "widgets": [{ "id": "w-1", "title": "Hello", "content": "<p>body</p>" }],
                    "context": "list"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let html = body["html"].as_str().unwrap();
        assert!(html.contains("widget-list"));
        assert!(html.contains("Hello"));
        assert!(html.contains("<p>body</p>"));
    }

    #[tokio::test]
    async fn ui_shell_is_served_at_root_and_ui() {
        let app = test_app();
        for uri in ["/", "/v1/widgets/ui", "/v1/widgets/ui?view=detail"] {
            let response = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "uri: {uri}");
            let body = body_text(response).await;
            assert!(body.contains("Activity Timeline"));
        }
    }

    #[tokio::test]
    async fn metrics_endpoint_reports_tool_counters() {
        let app = test_app();
        app.clone()
            .oneshot(post_json(
                "/v1/tools/echo",
                json!({ "arguments": { "message": "hi" } }),
            ))
            .await
            .unwrap();
        let response = app
            .oneshot(
                Request::get("/v1/tools/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; version=0.0.4"
        );
        let body = body_text(response).await;
        assert!(body.contains("toolrack_tool_requests_total{tool=\"echo\",status=\"success\"} 1"));
        assert!(body
            .contains("toolrack_http_requests_total{method=\"POST\",endpoint=\"/echo\",status=\"200\"} 1"));
    }

    #[tokio::test]
    async fn openapi_spec_is_served() {
        let app = test_app();
        let response = app
            .oneshot(
                Request::get("/spec/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["paths"]["/v1/tools"].is_object());
    }
}
