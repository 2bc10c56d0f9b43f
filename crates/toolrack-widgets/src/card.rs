use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// An action a client can trigger from a widget.
///
/// The server only ever hands the method/url/payload triple back to the
/// caller; it never performs the call itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WidgetAction {
    #[serde(default)]
    pub label: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default)]
    pub confirm: bool,
    #[serde(default = "default_confirm_message")]
    pub confirm_message: String,
}

fn default_method() -> String {
    "POST".into()
}

fn default_confirm_message() -> String {
    "Are you sure?".into()
}

impl WidgetAction {
    pub fn new(label: impl Into<String>, method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            method: method.into(),
            url: url.into(),
            payload: Map::new(),
            confirm: false,
            confirm_message: default_confirm_message(),
        }
    }

    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_confirm(mut self, message: impl Into<String>) -> Self {
        self.confirm = true;
        self.confirm_message = message.into();
        self
    }
}

/// A card shown on the activity timeline. Immutable once stored; replacing
/// the whole record is the only update path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WidgetCard {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub tool_name: String,
    #[serde(default)]
    pub actions: Vec<WidgetAction>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default = "default_card_type")]
    pub card_type: String,
    #[serde(default)]
    pub icon: String,
}

fn default_card_type() -> String {
    "default".into()
}

impl WidgetCard {
    /// Fresh card with a generated id and the current timestamp.
    pub fn new(service_name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: String::new(),
            timestamp: Utc::now(),
            service_name: service_name.into(),
            tool_name: String::new(),
            actions: Vec::new(),
            metadata: Map::new(),
            card_type: default_card_type(),
            icon: String::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_tool(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = tool_name.into();
        self
    }

    pub fn with_card_type(mut self, card_type: impl Into<String>) -> Self {
        self.card_type = card_type.into();
        self
    }

    pub fn with_actions(mut self, actions: Vec<WidgetAction>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn wire_round_trip_is_lossless() {
        let mut payload = Map::new();
        payload.insert("fact_id".into(), json!("f-1"));
        let mut metadata = Map::new();
        metadata.insert("source".into(), json!("unit-test"));

        let card = WidgetCard {
            id: "w-42".into(),
            title: "A <title>".into(),
            content: "<b>bold</b>".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 4, 12, 30, 15).unwrap(),
            service_name: "svc".into(),
            tool_name: "echo".into(),
            actions: vec![WidgetAction::new("Rerun", "POST", "/v1/tools/echo")
                .with_payload(payload)
                .with_confirm("Run again?")],
            metadata,
            card_type: "success".into(),
            icon: "bolt".into(),
        };

        let wire = serde_json::to_value(&card).unwrap();
        let parsed: WidgetCard = serde_json::from_value(wire).unwrap();
        assert_eq!(parsed, card);
    }

    #[test]
    fn missing_fields_get_defaults() {
        let parsed: WidgetCard = serde_json::from_value(json!({"title": "t"})).unwrap();
        assert_eq!(parsed.title, "t");
        assert_eq!(parsed.card_type, "default");
        assert!(parsed.actions.is_empty());

        let action: WidgetAction = serde_json::from_value(json!({"label": "Go"})).unwrap();
        assert_eq!(action.method, "POST");
        assert_eq!(action.confirm_message, "Are you sure?");
        assert!(!action.confirm);
    }

    #[test]
    fn new_card_stamps_identity() {
        let card = WidgetCard::new("svc", "hello").with_tool("echo");
        assert!(!card.id.is_empty());
        assert_eq!(card.service_name, "svc");
        assert_eq!(card.tool_name, "echo");
        let other = WidgetCard::new("svc", "hello");
        assert_ne!(card.id, other.id);
    }
}
