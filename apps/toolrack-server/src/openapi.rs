use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "toolrack-server",
        description = "Tool dispatch and widget timeline service"
    ),
    paths(
        crate::api_tools::list_tools,
        crate::api_tools::tool_schema,
        crate::api_tools::execute_simple,
        crate::api_tools::execute_sse,
        crate::api_tools::execute_jsonrpc,
        crate::api_tools::metrics_prometheus,
        crate::api_widgets::root_ui,
        crate::api_widgets::widget_ui,
        crate::api_widgets::render_widgets,
        crate::api_widgets::get_timeline,
        crate::api_widgets::create_widget,
        crate::api_widgets::widget_action,
    ),
    tags(
        (name = "tools", description = "Tool listing and execution"),
        (name = "widgets", description = "Widget rendering and activity timeline"),
        (name = "public", description = "Operational endpoints")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
