//! Collapse news items that share a `(symbol, timestamp)` key.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::core::{MergedNewsItem, NewsItem};

/// Joins the texts of items sharing a key, in arrival order.
pub const MERGE_SEPARATOR: &str = ". ";

/// Group `items` by exact `(symbol, timestamp)` and concatenate each group's
/// texts in arrival order.
///
/// Emits one [`MergedNewsItem`] per distinct key. Groups come out in the order
/// their key was first seen, though downstream treats each item independently.
pub fn merge_news<I>(items: I) -> Vec<MergedNewsItem>
where
    I: IntoIterator<Item = NewsItem>,
{
    let items = items.into_iter();
    let mut slots: HashMap<(String, DateTime<Utc>), usize> =
        HashMap::with_capacity(items.size_hint().0);
    let mut merged: Vec<MergedNewsItem> = Vec::with_capacity(items.size_hint().0);

    for item in items {
        let key = (item.symbol, item.timestamp);
        if let Some(&idx) = slots.get(&key) {
            let slot = &mut merged[idx];
            slot.merged_text.push_str(MERGE_SEPARATOR);
            slot.merged_text.push_str(&item.text);
        } else {
            slots.insert(key.clone(), merged.len());
            merged.push(MergedNewsItem {
                timestamp: key.1,
                symbol: key.0,
                merged_text: item.text,
            });
        }
    }

    merged
}
