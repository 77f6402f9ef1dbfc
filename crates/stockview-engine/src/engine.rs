//! Reconciliation of a category catalog with manufacturer availability.
//!
//! One call to [`Engine::reconcile`] runs these phases in order:
//!
//! 1. fetch and decode the catalog (any failure aborts the call)
//! 2. collect the distinct manufacturer names it references
//! 3. refetch the ones that are missing from the cache or stale, all at once
//! 4. merge successful refreshes into a new cache snapshot
//! 5. slice the requested page and attach availability to its products
//!
//! Manufacturer failures in phase 3 never fail the call. They are logged,
//! returned in [`Reconciliation::manufacturer_failures`], and the affected
//! products fall back to the previous cache entry or to no availability.

use std::collections::BTreeSet;
use std::num::NonZeroUsize;

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::join_all;
use stockview_core::{AppConfig, ManufacturerAvailability, Product};

use crate::availability::decode_availability;
use crate::cache::ManufacturerCache;
use crate::catalog::decode_catalog;
use crate::error::{EngineError, ManufacturerError};
use crate::pagination::{page_slice, total_pages};
use crate::source::StockSource;

/// Tunables for a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub page_size: NonZeroUsize,
    /// How long a cached manufacturer entry is trusted before refetching.
    pub freshness_window: TimeDelta,
}

impl EngineSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            page_size: NonZeroUsize::new(config.page_size).unwrap_or(NonZeroUsize::MIN),
            freshness_window: config.freshness_window(),
        }
    }
}

/// Output of one reconciliation.
#[derive(Debug)]
pub struct Reconciliation {
    /// Products on the requested page, in catalog order. Products with no
    /// matching stock record have `availability == None`.
    pub items: Vec<Product>,
    /// The requested page (1-indexed).
    pub page: usize,
    /// Number of products in the whole catalog.
    pub total_items: usize,
    pub total_page_count: usize,
    /// The input cache with this run's refreshes merged in. Callers keep it
    /// for the next request.
    pub updated_cache: ManufacturerCache,
    /// Manufacturers successfully refetched during this run, sorted.
    pub refreshed: Vec<String>,
    /// Manufacturers whose refresh failed during this run.
    pub manufacturer_failures: Vec<ManufacturerError>,
}

impl Reconciliation {
    /// Products on this page that did not get an availability value.
    pub fn unmatched(&self) -> impl Iterator<Item = &Product> {
        self.items.iter().filter(|p| p.availability.is_none())
    }
}

/// Reconciles catalogs with manufacturer availability fetched from `S`.
pub struct Engine<S> {
    source: S,
    settings: EngineSettings,
}

impl<S: StockSource> Engine<S> {
    pub fn new(source: S, settings: EngineSettings) -> Self {
        Self { source, settings }
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Produces one page of `category`, refreshing stale manufacturers.
    ///
    /// `cache` is not modified; the refreshed state is returned in
    /// [`Reconciliation::updated_cache`]. Refreshed entries are stamped with
    /// `now`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::InvalidPage`]: `page` is 0.
    /// - [`EngineError::CatalogFetch`]: the catalog could not be fetched.
    /// - [`EngineError::CatalogDecode`]: the catalog body has the wrong shape.
    pub async fn reconcile(
        &self,
        category: &str,
        page: usize,
        cache: &ManufacturerCache,
        now: DateTime<Utc>,
    ) -> Result<Reconciliation, EngineError> {
        if page == 0 {
            return Err(EngineError::InvalidPage { page });
        }

        let products = self.load_catalog(category).await?;

        let manufacturers: BTreeSet<String> = products
            .iter()
            .map(|p| p.manufacturer_name.clone())
            .collect();
        let stale = cache.stale_or_missing(&manufacturers, self.settings.freshness_window, now);
        tracing::debug!(
            category,
            products = products.len(),
            manufacturers = manufacturers.len(),
            stale = stale.len(),
            "catalog loaded"
        );

        let (fresh, manufacturer_failures) = self.refresh_manufacturers(&stale, now).await;
        for failure in &manufacturer_failures {
            let fallback = cache.get(failure.manufacturer()).is_some();
            tracing::warn!(
                category,
                manufacturer = failure.manufacturer(),
                fallback,
                error = %failure,
                "manufacturer refresh failed"
            );
        }

        let refreshed: Vec<String> = fresh.iter().map(|m| m.name.clone()).collect();
        let updated_cache = cache.merge(fresh);

        let total_items = products.len();
        let total_page_count = total_pages(total_items, self.settings.page_size);
        let items: Vec<Product> = page_slice(&products, self.settings.page_size, page)
            .iter()
            .map(|product| match_product(product, &updated_cache))
            .collect();

        let result = Reconciliation {
            items,
            page,
            total_items,
            total_page_count,
            updated_cache,
            refreshed,
            manufacturer_failures,
        };
        tracing::info!(
            category,
            page,
            total_page_count,
            items = result.items.len(),
            unmatched = result.unmatched().count(),
            refreshed = result.refreshed.len(),
            failed = result.manufacturer_failures.len(),
            "reconciled category"
        );
        Ok(result)
    }

    async fn load_catalog(&self, category: &str) -> Result<Vec<Product>, EngineError> {
        let body = self
            .source
            .fetch_catalog(category)
            .await
            .map_err(|source| EngineError::CatalogFetch {
                category: category.to_owned(),
                source,
            })?;
        decode_catalog(&body).map_err(|source| EngineError::CatalogDecode {
            category: category.to_owned(),
            source,
        })
    }

    /// Fetches every manufacturer in `names` concurrently and waits for all
    /// of them. Successes come back in name order.
    async fn refresh_manufacturers(
        &self,
        names: &BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> (Vec<ManufacturerAvailability>, Vec<ManufacturerError>) {
        let results = join_all(names.iter().map(|name| self.refresh_one(name, now))).await;

        let mut fresh = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(entry) => fresh.push(entry),
                Err(err) => failures.push(err),
            }
        }
        (fresh, failures)
    }

    async fn refresh_one(
        &self,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<ManufacturerAvailability, ManufacturerError> {
        let body = self
            .source
            .fetch_availability(name)
            .await
            .map_err(|source| ManufacturerError::Fetch {
                manufacturer: name.to_owned(),
                source,
            })?;
        let decoded = decode_availability(&body).map_err(|source| ManufacturerError::Decode {
            manufacturer: name.to_owned(),
            source,
        })?;
        tracing::debug!(
            manufacturer = name,
            records = decoded.records.len(),
            "manufacturer refreshed"
        );
        Ok(decoded.into_entry(name, now))
    }
}

/// Returns `product` with the stock value from its manufacturer's cache
/// entry, or with no availability when the manufacturer or record is unknown.
#[must_use]
pub fn match_product(product: &Product, cache: &ManufacturerCache) -> Product {
    let availability = cache
        .get(&product.manufacturer_name)
        .and_then(|manufacturer| manufacturer.record_for(&product.id))
        .map(|record| record.availability.clone());
    product.with_availability(availability)
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
