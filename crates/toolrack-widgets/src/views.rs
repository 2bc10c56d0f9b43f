//! View contexts and the built-in HTML card renderers.
//!
//! Escaping policy: titles, labels and meta text are HTML-escaped; card
//! `content` is emitted raw and treated as pre-sanitised markup.

use serde_json::{json, Map, Value};

use crate::card::{WidgetAction, WidgetCard};
use crate::device::{classify, DeviceClass};

/// View kind and/or device class a renderer is keyed by.
///
/// Composite tags are the canonical lookup form; the bare kinds `List` and
/// `Detail` are resolved against the device classifier first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewContext {
    List,
    Detail,
    Mobile,
    Desktop,
    Default,
    ListMobile,
    ListDesktop,
    DetailMobile,
    DetailDesktop,
}

impl ViewContext {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewContext::List => "list",
            ViewContext::Detail => "detail",
            ViewContext::Mobile => "mobile",
            ViewContext::Desktop => "desktop",
            ViewContext::Default => "default",
            ViewContext::ListMobile => "list_mobile",
            ViewContext::ListDesktop => "list_desktop",
            ViewContext::DetailMobile => "detail_mobile",
            ViewContext::DetailDesktop => "detail_desktop",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "list" => Some(ViewContext::List),
            "detail" => Some(ViewContext::Detail),
            "mobile" => Some(ViewContext::Mobile),
            "desktop" => Some(ViewContext::Desktop),
            "default" => Some(ViewContext::Default),
            "list_mobile" => Some(ViewContext::ListMobile),
            "list_desktop" => Some(ViewContext::ListDesktop),
            "detail_mobile" => Some(ViewContext::DetailMobile),
            "detail_desktop" => Some(ViewContext::DetailDesktop),
            _ => None,
        }
    }

    pub fn is_composite(self) -> bool {
        matches!(
            self,
            ViewContext::ListMobile
                | ViewContext::ListDesktop
                | ViewContext::DetailMobile
                | ViewContext::DetailDesktop
        )
    }

    /// Resolve to a composite context. Composites pass through; `List` and
    /// `Detail` combine with the classified device; everything else passes
    /// through unchanged.
    pub fn resolve(self, user_agent: Option<&str>) -> Self {
        if self.is_composite() {
            return self;
        }
        let device = classify(user_agent);
        match (self, device) {
            (ViewContext::List, DeviceClass::Mobile) => ViewContext::ListMobile,
            (ViewContext::List, DeviceClass::Desktop) => ViewContext::ListDesktop,
            (ViewContext::Detail, DeviceClass::Mobile) => ViewContext::DetailMobile,
            (ViewContext::Detail, DeviceClass::Desktop) => ViewContext::DetailDesktop,
            (other, _) => other,
        }
    }
}

/// One widget plus the context it should be rendered in.
#[derive(Debug, Clone)]
pub struct ViewRequest {
    pub context: ViewContext,
    pub widget: WidgetCard,
    pub base_path: String,
    pub metadata: Map<String, Value>,
}

impl ViewRequest {
    pub fn new(context: ViewContext, widget: WidgetCard) -> Self {
        Self {
            context,
            widget,
            base_path: "/v1/widgets".into(),
            metadata: Map::new(),
        }
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }
}

/// Renderer for one view context. Output is an HTML fragment.
pub trait WidgetView: Send + Sync {
    fn context(&self) -> ViewContext;

    fn render(&self, request: &ViewRequest) -> String;

    /// Batch rendering; the default just concatenates single renders.
    fn render_many(&self, requests: &[ViewRequest]) -> String {
        requests
            .iter()
            .map(|req| self.render(req))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// JSON blob handed to the client-side `handleWidgetAction` helper.
fn action_json(action: &WidgetAction) -> String {
    json!({
        "method": action.method,
        "url": action.url,
        "payload": action.payload,
        "confirm": action.confirm,
        "confirm_message": action.confirm_message,
    })
    .to_string()
}

fn action_button(widget_id: &str, idx: usize, action: &WidgetAction, class: &str) -> String {
    format!(
        "<button class=\"{class}\" onclick=\"handleWidgetAction('{id}', {idx}, {blob})\">{label}</button>",
        id = widget_id,
        blob = escape_html(&action_json(action)),
        label = escape_html(&action.label),
    )
}

fn desktop_actions(widget: &WidgetCard) -> String {
    if widget.actions.is_empty() {
        return String::new();
    }
    let buttons: String = widget
        .actions
        .iter()
        .enumerate()
        .map(|(idx, action)| {
            let class = if idx == 0 {
                "action-btn"
            } else {
                "action-btn secondary"
            };
            action_button(&widget.id, idx, action, class)
        })
        .collect();
    format!("<div class=\"widget-actions\">{buttons}</div>")
}

/// Mobile layout keeps the primary action visible and tucks the rest behind
/// an overflow menu.
fn mobile_actions(widget: &WidgetCard) -> String {
    let Some(primary) = widget.actions.first() else {
        return String::new();
    };
    let menu = if widget.actions.len() > 1 {
        format!(
            "<button class=\"action-btn menu\" onclick=\"showActionMenu('{}')\">&#8943;</button>",
            widget.id
        )
    } else {
        String::new()
    };
    format!(
        "<div class=\"widget-actions mobile\">{}{}</div>",
        action_button(&widget.id, 0, primary, "action-btn primary"),
        menu
    )
}

fn desktop_meta(widget: &WidgetCard) -> String {
    let mut parts = Vec::new();
    if !widget.service_name.is_empty() {
        parts.push(escape_html(&widget.service_name));
    }
    if !widget.tool_name.is_empty() {
        parts.push(escape_html(&widget.tool_name));
    }
    parts.push(widget.timestamp.format("%Y-%m-%d %H:%M:%S").to_string());
    parts.join(" &bull; ")
}

fn mobile_meta(widget: &WidgetCard, include_tool: bool) -> String {
    let mut parts = Vec::new();
    if !widget.service_name.is_empty() {
        parts.push(escape_html(&widget.service_name));
    }
    if include_tool && !widget.tool_name.is_empty() {
        parts.push(escape_html(&widget.tool_name));
    }
    parts.push(widget.timestamp.format("%m/%d %H:%M").to_string());
    parts.join(" &bull; ")
}

fn desktop_card(widget: &WidgetCard, extra_class: &str) -> String {
    format!(
        "<div class=\"widget-card{extra} {card_type}\" data-widget-id=\"{id}\">\
         <div class=\"widget-header\"><div>\
         <div class=\"widget-title\">{title}</div>\
         <div class=\"widget-meta\">{meta}</div>\
         </div></div>\
         <div class=\"widget-content\">{content}</div>{actions}</div>",
        extra = extra_class,
        card_type = widget.card_type,
        id = widget.id,
        title = escape_html(&widget.title),
        meta = desktop_meta(widget),
        content = widget.content,
        actions = desktop_actions(widget),
    )
}

fn mobile_card(widget: &WidgetCard, extra_class: &str, include_tool_meta: bool) -> String {
    format!(
        "<div class=\"widget-card mobile{extra} {card_type}\" data-widget-id=\"{id}\">\
         <div class=\"widget-header mobile\">\
         <div class=\"widget-title\">{title}</div>\
         <div class=\"widget-meta\">{meta}</div>\
         </div>\
         <div class=\"widget-content mobile\">{content}</div>{actions}</div>",
        extra = extra_class,
        card_type = widget.card_type,
        id = widget.id,
        title = escape_html(&widget.title),
        meta = mobile_meta(widget, include_tool_meta),
        content = widget.content,
        actions = mobile_actions(widget),
    )
}

fn metadata_block(widget: &WidgetCard, mobile: bool) -> String {
    if widget.metadata.is_empty() {
        return String::new();
    }
    let class = if mobile { " mobile" } else { "" };
    let items: String = widget
        .metadata
        .iter()
        .map(|(key, value)| {
            let value_text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!(
                "<div class=\"metadata-item{class}\"><strong>{}:</strong> <span>{}</span></div>",
                escape_html(key),
                escape_html(&value_text),
            )
        })
        .collect();
    format!("<div class=\"widget-metadata{class}\">{items}</div>")
}

/// Generic fallback card bound to an arbitrary context. Desktop-style layout.
pub struct CardView {
    context: ViewContext,
}

impl CardView {
    pub fn new(context: ViewContext) -> Self {
        Self { context }
    }
}

impl WidgetView for CardView {
    fn context(&self) -> ViewContext {
        self.context
    }

    fn render(&self, request: &ViewRequest) -> String {
        desktop_card(&request.widget, "")
    }
}

/// Compact single-card mobile view.
pub struct MobileCardView;

impl WidgetView for MobileCardView {
    fn context(&self) -> ViewContext {
        ViewContext::Mobile
    }

    fn render(&self, request: &ViewRequest) -> String {
        mobile_card(&request.widget, "", false)
    }
}

/// Timeline list view; batch output wraps the cards in a list container.
pub struct ListView {
    context: ViewContext,
    mobile: bool,
}

impl ListView {
    pub fn desktop() -> Self {
        Self {
            context: ViewContext::ListDesktop,
            mobile: false,
        }
    }

    pub fn mobile() -> Self {
        Self {
            context: ViewContext::ListMobile,
            mobile: true,
        }
    }
}

impl WidgetView for ListView {
    fn context(&self) -> ViewContext {
        self.context
    }

    fn render(&self, request: &ViewRequest) -> String {
        if self.mobile {
            mobile_card(&request.widget, " list", false)
        } else {
            desktop_card(&request.widget, "")
        }
    }

    fn render_many(&self, requests: &[ViewRequest]) -> String {
        let cards = requests
            .iter()
            .map(|req| self.render(req))
            .collect::<Vec<_>>()
            .join("\n");
        let class = if self.mobile {
            "widget-list mobile"
        } else {
            "widget-list"
        };
        format!("<div class=\"{class}\">{cards}</div>")
    }
}

/// Single-widget detail view with the expanded metadata section.
pub struct DetailView {
    context: ViewContext,
    mobile: bool,
}

impl DetailView {
    pub fn desktop() -> Self {
        Self {
            context: ViewContext::DetailDesktop,
            mobile: false,
        }
    }

    pub fn mobile() -> Self {
        Self {
            context: ViewContext::DetailMobile,
            mobile: true,
        }
    }
}

impl WidgetView for DetailView {
    fn context(&self) -> ViewContext {
        self.context
    }

    fn render(&self, request: &ViewRequest) -> String {
        let widget = &request.widget;
        if self.mobile {
            format!(
                "<div class=\"widget-detail mobile\">{}{}</div>",
                mobile_card(widget, " detail", true),
                metadata_block(widget, true)
            )
        } else {
            format!(
                "<div class=\"widget-detail\">{}{}</div>",
                desktop_card(widget, ""),
                metadata_block(widget, false)
            )
        }
    }
}
