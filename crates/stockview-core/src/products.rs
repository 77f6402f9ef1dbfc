use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A catalog product, optionally annotated with its manufacturer's stock value.
///
/// Serializes with the upstream catalog field names (`type`, `color`,
/// `manufacturer`) so JSON output reads like the catalog it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Upstream product id, e.g. `"f33561de3a864f951a"`. Matched against
    /// stock records case-insensitively.
    pub id: String,
    /// Category tag, e.g. `"jackets"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(rename = "color")]
    pub colors: Vec<String>,
    pub price: f64,
    #[serde(rename = "manufacturer")]
    pub manufacturer_name: String,
    /// Normalized stock value (e.g. `"INSTOCK"`). `None` until reconciled, and
    /// stays `None` when no stock record matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
}

impl Product {
    /// The key used to look this product up in a manufacturer's records.
    #[must_use]
    pub fn match_key(&self) -> String {
        self.id.to_uppercase()
    }

    /// Returns a copy of this product carrying the given stock value.
    #[must_use]
    pub fn with_availability(&self, availability: Option<String>) -> Self {
        Self {
            availability,
            ..self.clone()
        }
    }
}

/// One decoded entry of a manufacturer availability feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Item id exactly as the manufacturer sent it.
    pub item_id: String,
    /// Text extracted from the record's embedded `INSTOCKVALUE` element.
    pub availability: String,
}

/// The most recent successful availability response for one manufacturer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturerAvailability {
    pub name: String,
    /// The `code` field reported inside the feed body.
    pub status_code: i64,
    /// Records keyed by uppercased item id.
    records: HashMap<String, StockRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl ManufacturerAvailability {
    /// Builds an entry from decoded records.
    ///
    /// When several records share an item id (compared case-insensitively),
    /// the first one seen wins and later ones are dropped.
    pub fn new(
        name: impl Into<String>,
        status_code: i64,
        records: impl IntoIterator<Item = StockRecord>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let mut by_id: HashMap<String, StockRecord> = HashMap::new();
        for record in records {
            by_id
                .entry(record.item_id.to_uppercase())
                .or_insert(record);
        }
        Self {
            name: name.into(),
            status_code,
            records: by_id,
            fetched_at,
        }
    }

    /// Looks up the stock record for a catalog product id.
    #[must_use]
    pub fn record_for(&self, product_id: &str) -> Option<&StockRecord> {
        self.records.get(&product_id.to_uppercase())
    }

    pub fn records(&self) -> impl Iterator<Item = &StockRecord> {
        self.records.values()
    }

    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// `true` while `fetched_at` is within `window` of `now`.
    ///
    /// An entry fetched exactly `window` ago is still fresh.
    #[must_use]
    pub fn is_fresh(&self, window: TimeDelta, now: DateTime<Utc>) -> bool {
        self.fetched_at >= now - window
    }
}
