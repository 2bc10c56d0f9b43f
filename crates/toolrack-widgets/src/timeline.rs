//! Bounded activity timeline.
//!
//! A fixed-capacity deque of locally pushed cards, merged on demand with
//! whatever the registered providers return. Provider failures are logged
//! and skipped so one bad source never empties the feed.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::card::WidgetCard;
use crate::provider::WidgetProvider;

pub const DEFAULT_CAPACITY: usize = 1000;

pub struct Timeline {
    capacity: usize,
    cards: Mutex<VecDeque<WidgetCard>>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Timeline {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            cards: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
        }
    }

    /// Append a card, evicting the oldest entry once at capacity.
    pub fn push(&self, card: WidgetCard) {
        let mut cards = self.cards.lock().expect("timeline poisoned");
        if cards.len() == self.capacity {
            cards.pop_front();
        }
        cards.push_back(card);
    }

    pub fn len(&self) -> usize {
        self.cards.lock().expect("timeline poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, id: &str) -> Option<WidgetCard> {
        self.cards
            .lock()
            .expect("timeline poisoned")
            .iter()
            .find(|card| card.id == id)
            .cloned()
    }

    /// Merged snapshot: provider cards plus local pushes, newest first,
    /// de-duplicated by id (first occurrence wins) and capped at `limit`.
    ///
    /// The `since` filter applies to provider queries only; local cards are
    /// filtered here after the merge.
    pub async fn snapshot(
        &self,
        providers: &[Arc<dyn WidgetProvider>],
        limit: usize,
        since: Option<DateTime<Utc>>,
    ) -> Vec<WidgetCard> {
        let mut merged: Vec<WidgetCard> = Vec::new();
        for provider in providers {
            match provider.widgets(limit, since).await {
                Ok(cards) => merged.extend(cards),
                Err(err) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %err,
                        "widget provider failed, skipping"
                    );
                }
            }
        }
        {
            let cards = self.cards.lock().expect("timeline poisoned");
            merged.extend(cards.iter().filter(|card| match since {
                Some(cutoff) => card.timestamp > cutoff,
                None => true,
            }).cloned());
        }

        merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let mut seen = std::collections::HashSet::new();
        merged.retain(|card| seen.insert(card.id.clone()));
        merged.truncate(limit);
        merged
    }
}
