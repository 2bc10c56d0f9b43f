//! Widget endpoints: the server-rendered UI shell, HTML rendering, the
//! activity timeline, and widget creation/action lookup.

use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use toolrack_widgets::{ViewContext, ViewRequest, WidgetCard};

use crate::{ui, AppState};

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[derive(Deserialize)]
pub struct UiQuery {
    #[serde(default)]
    pub view: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RenderRequest {
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub widgets: Vec<WidgetCard>,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Deserialize)]
pub struct TimelineQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub since: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateRequest {
    #[schema(value_type = Object)]
    pub widget: WidgetCard,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ActionRequest {
    #[serde(default)]
    pub action_index: usize,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "widgets",
    responses((status = 200, description = "Widget timeline UI", content_type = "text/html"))
)]
pub async fn root_ui(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let html = ui::render_shell(&state.config().widgets_base);
    state.record_http("GET", "/", 200, started, None);
    Html(html).into_response()
}

#[utoipa::path(
    get,
    path = "/v1/widgets/ui",
    tag = "widgets",
    params(("view" = Option<String>, Query, description = "View kind, list or detail")),
    responses((status = 200, description = "Widget timeline UI", content_type = "text/html"))
)]
pub async fn widget_ui(State(state): State<AppState>, Query(query): Query<UiQuery>) -> Response {
    let started = Instant::now();
    // The shell is shared between views; cards are fetched and rendered
    // client-side, so an unknown view value just behaves like the list view.
    if let Some(view) = &query.view {
        tracing::debug!(view = %view, "widget ui requested");
    }
    let html = ui::render_shell(&state.config().widgets_base);
    state.record_http("GET", "/ui", 200, started, None);
    Html(html).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/widgets/render",
    tag = "widgets",
    responses((status = 200, description = "Rendered HTML for the submitted widgets"))
)]
pub async fn render_widgets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RenderRequest>,
) -> Response {
    let started = Instant::now();
    let context = request
        .context
        .as_deref()
        .and_then(ViewContext::parse)
        .unwrap_or(ViewContext::List);
    let base_path = state.config().widgets_base.clone();
    let requests: Vec<ViewRequest> = request
        .widgets
        .into_iter()
        .map(|widget| ViewRequest::new(context, widget).with_base_path(base_path.clone()))
        .collect();
    let html = state
        .views()
        .render_many(&requests, user_agent(&headers).as_deref());
    state.record_http("POST", "/render", 200, started, None);
    Json(json!({ "html": html })).into_response()
}

#[utoipa::path(
    get,
    path = "/v1/widgets/timeline",
    tag = "widgets",
    params(
        ("limit" = Option<usize>, Query, description = "Maximum widgets to return"),
        ("since" = Option<String>, Query, description = "RFC 3339 cutoff, only newer widgets")
    ),
    responses(
        (status = 200, description = "Merged activity timeline"),
        (status = 400, description = "Unparseable since timestamp")
    )
)]
pub async fn get_timeline(
    State(state): State<AppState>,
    Query(query): Query<TimelineQuery>,
) -> Response {
    let started = Instant::now();
    let limit = query.limit.unwrap_or(50);
    let since: Option<DateTime<Utc>> = match &query.since {
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(_) => {
                state.record_http("GET", "/timeline", 400, started, Some("validation_error"));
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("invalid since timestamp: {raw}") })),
                )
                    .into_response();
            }
        },
        None => None,
    };
    let widgets = state
        .timeline()
        .snapshot(state.providers(), limit, since)
        .await;
    state.record_http("GET", "/timeline", 200, started, None);
    Json(json!({ "widgets": widgets })).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/widgets/create",
    tag = "widgets",
    responses((status = 200, description = "The stored widget"))
)]
pub async fn create_widget(
    State(state): State<AppState>,
    Json(request): Json<CreateRequest>,
) -> Response {
    let started = Instant::now();
    let mut widget = request.widget;
    if widget.id.is_empty() {
        widget.id = Uuid::new_v4().to_string();
    }
    state.timeline().push(widget.clone());
    state.record_http("POST", "/create", 200, started, None);
    Json(json!({ "widget": widget })).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/widgets/action/{widget_id}",
    tag = "widgets",
    params(("widget_id" = String, Path, description = "Timeline widget id")),
    responses(
        (status = 200, description = "Action details for the client to execute"),
        (status = 400, description = "Action index out of range"),
        (status = 404, description = "Widget not on the timeline")
    )
)]
pub async fn widget_action(
    State(state): State<AppState>,
    Path(widget_id): Path<String>,
    Json(request): Json<ActionRequest>,
) -> Response {
    let started = Instant::now();
    let endpoint = format!("/action/{widget_id}");

    let Some(widget) = state.timeline().find(&widget_id) else {
        state.record_http("POST", &endpoint, 404, started, Some("not_found"));
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Widget '{widget_id}' not found") })),
        )
            .into_response();
    };

    let Some(action) = widget.actions.get(request.action_index) else {
        state.record_http("POST", &endpoint, 400, started, Some("validation_error"));
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid action index" })),
        )
            .into_response();
    };

    state.record_http("POST", &endpoint, 200, started, None);
    Json(json!({
        "action": {
            "method": action.method,
            "url": action.url,
            "payload": action.payload,
        }
    }))
    .into_response()
}
