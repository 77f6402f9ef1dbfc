//! In-memory manufacturer availability cache.
//!
//! A [`ManufacturerCache`] is an immutable snapshot: [`ManufacturerCache::merge`]
//! returns a new cache and leaves the receiver untouched. Entries are shared
//! behind `Arc`, so snapshots are cheap to clone and hand to concurrent
//! readers.
//!
//! Staleness only decides what to refetch. Nothing is evicted for being old;
//! an entry lives until a successful fetch replaces it, so a failed refresh
//! still leaves the last known-good data in place.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use stockview_core::ManufacturerAvailability;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManufacturerCache {
    entries: HashMap<String, Arc<ManufacturerAvailability>>,
}

impl ManufacturerCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ManufacturerAvailability> {
        self.entries.get(name).map(Arc::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached manufacturer names in sorted order.
    #[must_use]
    pub fn names(&self) -> BTreeSet<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Returns every name in `names` that is either not cached or was fetched
    /// more than `freshness_window` before `now`.
    #[must_use]
    pub fn stale_or_missing(
        &self,
        names: &BTreeSet<String>,
        freshness_window: TimeDelta,
        now: DateTime<Utc>,
    ) -> BTreeSet<String> {
        names
            .iter()
            .filter(|name| {
                self.get(name)
                    .is_none_or(|entry| !entry.is_fresh(freshness_window, now))
            })
            .cloned()
            .collect()
    }

    /// Returns a new cache where each entry in `fresh` replaces any cached
    /// entry of the same name. Entries not named in `fresh` carry over as-is.
    #[must_use]
    pub fn merge<I>(&self, fresh: I) -> Self
    where
        I: IntoIterator<Item = ManufacturerAvailability>,
    {
        let mut entries = self.entries.clone();
        for entry in fresh {
            entries.insert(entry.name.clone(), Arc::new(entry));
        }
        Self { entries }
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
