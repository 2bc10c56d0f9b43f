//! Stock echo tool and its activity provider. Doubles as a working example
//! of the handler and provider seams.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use toolrack_core::{parse_args, ToolError, ToolHandler};
use toolrack_widgets::{escape_html, WidgetAction, WidgetCard, WidgetProvider};

const ACTIVITY_CAPACITY: usize = 100;

/// Keeps a bounded ring of cards for tools that want their executions to
/// show up on the timeline.
pub struct ActivityProvider {
    cards: Mutex<VecDeque<WidgetCard>>,
}

impl Default for ActivityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityProvider {
    pub fn new() -> Self {
        Self {
            cards: Mutex::new(VecDeque::new()),
        }
    }

    pub fn record(&self, card: WidgetCard) {
        let mut cards = self.cards.lock().expect("activity lock");
        if cards.len() == ACTIVITY_CAPACITY {
            cards.pop_front();
        }
        cards.push_back(card);
    }
}

#[async_trait]
impl WidgetProvider for ActivityProvider {
    fn name(&self) -> &str {
        "activity"
    }

    async fn widgets(
        &self,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Vec<WidgetCard>> {
        let cards = self.cards.lock().expect("activity lock");
        let mut out: Vec<WidgetCard> = cards
            .iter()
            .filter(|card| since.map_or(true, |cutoff| card.timestamp > cutoff))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out.truncate(limit);
        Ok(out)
    }
}

#[derive(Deserialize)]
struct EchoArgs {
    message: String,
}

/// Echoes its message back and records the call as a timeline card.
pub struct EchoTool {
    activity: Arc<ActivityProvider>,
}

impl EchoTool {
    pub fn new(activity: Arc<ActivityProvider>) -> Self {
        Self { activity }
    }
}

#[async_trait]
impl ToolHandler for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo a message back to the caller"
    }

    fn schema(&self) -> Value {
        json!({
            "name": "echo",
            "description": self.description(),
            "inputSchema": {
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "Message to echo back"
                    }
                },
                "required": ["message"]
            }
        })
    }

    async fn handle(&self, arguments: Value) -> Result<Vec<Value>, ToolError> {
        let args: EchoArgs = parse_args(&arguments)?;
        let reply = format!("Echo: {}", args.message);

        let card = self
            .activity
            .new_card("Echo executed")
            .with_tool("echo")
            .with_content(format!("<p>{}</p>", escape_html(&reply)))
            .with_card_type("info")
            .with_actions(vec![WidgetAction::new(
                "Echo again",
                "POST",
                "/v1/tools/echo",
            )
            .with_payload(
                json!({ "arguments": { "message": args.message } })
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            )]);
        self.activity.record(card);

        Ok(vec![json!({ "type": "text", "text": reply })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echo_replies_and_records_a_card() {
        let activity = Arc::new(ActivityProvider::new());
        let tool = EchoTool::new(activity.clone());

        let items = tool
            .handle(json!({ "message": "hello" }))
            .await
            .expect("echo should succeed");
        assert_eq!(items[0]["text"], "Echo: hello");

        let cards = activity.widgets(10, None).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].tool_name, "echo");
        assert_eq!(cards[0].actions[0].label, "Echo again");
    }

    #[tokio::test]
    async fn echo_rejects_missing_message() {
        let tool = EchoTool::new(Arc::new(ActivityProvider::new()));
        let err = tool.handle(json!({})).await.unwrap_err();
        assert_eq!(err.kind(), "invalid");
    }

    #[tokio::test]
    async fn activity_ring_is_bounded() {
        let activity = ActivityProvider::new();
        for i in 0..(ACTIVITY_CAPACITY + 5) {
            activity.record(WidgetCard::new("toolrack", format!("card {i}")));
        }
        let cards = activity.widgets(ACTIVITY_CAPACITY + 5, None).await.unwrap();
        assert_eq!(cards.len(), ACTIVITY_CAPACITY);
    }
}
