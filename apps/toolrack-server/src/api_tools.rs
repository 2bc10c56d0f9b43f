//! Tool endpoints: listing, schemas, and the three execution transports
//! (plain POST, SSE, JSON-RPC).

use std::convert::Infallible;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::stream;
use serde_json::{json, Value};

use toolrack_core::DispatchError;
use toolrack_protocol::{rpc_codes, RpcRequest, RpcResponse};

use crate::metrics::PROMETHEUS_CONTENT_TYPE;
use crate::AppState;

fn arguments_from(body: &Value) -> Value {
    body.get("arguments").cloned().unwrap_or_else(|| json!({}))
}

fn rpc_code_for(err: &DispatchError) -> i64 {
    match err {
        DispatchError::NotFound(_) => rpc_codes::NOT_FOUND,
        DispatchError::Validation(_) => rpc_codes::VALIDATION_ERROR,
        DispatchError::Execution(_) => rpc_codes::INTERNAL_ERROR,
    }
}

#[utoipa::path(
    get,
    path = "/v1/tools",
    tag = "tools",
    responses((status = 200, description = "Descriptors for every registered tool"))
)]
pub async fn list_tools(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let tools = state.dispatcher().list();
    state.record_http("GET", "/", 200, started, None);
    Json(json!({ "tools": tools })).into_response()
}

#[utoipa::path(
    get,
    path = "/v1/tools/{tool_name}/schema",
    tag = "tools",
    params(("tool_name" = String, Path, description = "Registered tool name")),
    responses(
        (status = 200, description = "Tool schema"),
        (status = 404, description = "Unknown tool")
    )
)]
pub async fn tool_schema(
    State(state): State<AppState>,
    Path(tool_name): Path<String>,
) -> Response {
    let started = Instant::now();
    let endpoint = format!("/{tool_name}/schema");
    match state.dispatcher().schema(&tool_name) {
        Some(schema) => {
            state.record_http("GET", &endpoint, 200, started, None);
            Json(schema).into_response()
        }
        None => {
            state.record_http("GET", &endpoint, 404, started, Some("not_found"));
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("tool '{tool_name}' not found") })),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/tools/{tool_name}",
    tag = "tools",
    params(("tool_name" = String, Path, description = "Registered tool name")),
    responses(
        (status = 200, description = "Execution result"),
        (status = 400, description = "Invalid arguments"),
        (status = 404, description = "Unknown tool"),
        (status = 500, description = "Tool execution failed")
    )
)]
pub async fn execute_simple(
    State(state): State<AppState>,
    Path(tool_name): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let started = Instant::now();
    let endpoint = format!("/{tool_name}");
    match state
        .dispatcher()
        .execute(&tool_name, arguments_from(&body))
        .await
    {
        Ok(items) => {
            state.record_http("POST", &endpoint, 200, started, None);
            Json(json!({ "result": items })).into_response()
        }
        Err(err) => {
            let status = err.http_status();
            state.record_http("POST", &endpoint, status, started, Some(err.kind()));
            (
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/tools/{tool_name}/sse",
    tag = "tools",
    params(("tool_name" = String, Path, description = "Registered tool name")),
    responses((status = 200, description = "Event stream of result items", content_type = "text/event-stream"))
)]
pub async fn execute_sse(
    State(state): State<AppState>,
    Path(tool_name): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let started = Instant::now();
    let endpoint = format!("/{tool_name}/sse");

    // One frame per result item, then a terminal [DONE]. Failures surface as
    // an in-band error frame with no terminator, still on a 200 response.
    let frames: Vec<String> = match state
        .dispatcher()
        .execute(&tool_name, arguments_from(&body))
        .await
    {
        Ok(items) => {
            let mut frames: Vec<String> = items
                .iter()
                .map(|item| serde_json::to_string(item).unwrap_or_default())
                .collect();
            frames.push("[DONE]".to_string());
            frames
        }
        Err(err) => vec![json!({ "error": err.to_string() }).to_string()],
    };
    state.record_http("POST", &endpoint, 200, started, None);

    let stream = stream::iter(
        frames
            .into_iter()
            .map(|frame| Ok::<_, Infallible>(Event::default().data(frame))),
    );
    Sse::new(stream).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/tools/{tool_name}/jsonrpc",
    tag = "tools",
    params(("tool_name" = String, Path, description = "Registered tool name")),
    request_body = Object,
    responses(
        (status = 200, description = "JSON-RPC 2.0 response, success or error object"),
        (status = 400, description = "Method name does not match the route")
    )
)]
pub async fn execute_jsonrpc(
    State(state): State<AppState>,
    Path(tool_name): Path<String>,
    Json(request): Json<RpcRequest>,
) -> Response {
    let started = Instant::now();
    let endpoint = format!("/{tool_name}/jsonrpc");

    if let Some(method) = &request.method {
        if method != &tool_name {
            state.record_http("POST", &endpoint, 400, started, Some("validation_error"));
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Method name mismatch" })),
            )
                .into_response();
        }
    }

    let params = match request.params {
        Value::Null => json!({}),
        other => other,
    };
    match state.dispatcher().execute(&tool_name, params).await {
        Ok(items) => {
            state.record_http("POST", &endpoint, 200, started, None);
            Json(RpcResponse::result(request.id, json!(items))).into_response()
        }
        Err(err) => {
            // RPC errors ride on a 200 transport; the metric keeps the real
            // failure status.
            state.record_http("POST", &endpoint, err.http_status(), started, Some(err.kind()));
            Json(RpcResponse::error(
                request.id,
                rpc_code_for(&err),
                err.to_string(),
            ))
            .into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/tools/metrics",
    tag = "public",
    responses((status = 200, description = "Prometheus metrics", content_type = "text/plain", body = String))
)]
pub async fn metrics_prometheus(State(state): State<AppState>) -> Response {
    if !state.config().observability {
        return (
            [(header::CONTENT_TYPE, "text/plain")],
            "# Metrics disabled\n".to_string(),
        )
            .into_response();
    }
    let body = state.metrics().render_prometheus();
    ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body).into_response()
}
