use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::card::WidgetCard;

/// Source of timeline cards. Implementations own their storage; the
/// timeline only ever asks for bounded, optionally time-filtered slices.
#[async_trait]
pub trait WidgetProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Return up to `limit` cards, newest first. When `since` is set only
    /// cards strictly newer than it are included.
    async fn widgets(
        &self,
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> anyhow::Result<Vec<WidgetCard>>;

    /// Fresh card stamped with this provider's name as the service.
    fn new_card(&self, title: impl Into<String>) -> WidgetCard
    where
        Self: Sized,
    {
        WidgetCard::new(self.name(), title)
    }
}
