//! Single-writer owner of the manufacturer cache across reconciliations.
//!
//! Every load is numbered with a generation. A load reconciles against a
//! snapshot of the cache and, when it finishes, merges only the entries it
//! refreshed into the session's current cache. If a newer load has already
//! committed (or the cache was cleared after this load started) the late
//! result is still returned to the caller but its cache writes are dropped.
//!
//! Dropping an in-flight load future writes nothing.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::cache::ManufacturerCache;
use crate::engine::{Engine, Reconciliation};
use crate::error::EngineError;
use crate::source::StockSource;

/// A reconciled page together with the generation that produced it.
#[derive(Debug)]
pub struct SessionPage {
    pub generation: u64,
    /// `false` when a newer load had already committed, so this page's cache
    /// refreshes were discarded. Callers usually skip rendering such pages.
    pub committed: bool,
    pub reconciliation: Reconciliation,
}

#[derive(Debug)]
struct SessionState {
    cache: ManufacturerCache,
    committed_generation: u64,
}

pub struct Session<S> {
    engine: Engine<S>,
    state: Mutex<SessionState>,
    started_generation: AtomicU64,
}

impl<S: StockSource> Session<S> {
    pub fn new(engine: Engine<S>) -> Self {
        Self::with_cache(engine, ManufacturerCache::new())
    }

    pub fn with_cache(engine: Engine<S>, cache: ManufacturerCache) -> Self {
        Self {
            engine,
            state: Mutex::new(SessionState {
                cache,
                committed_generation: 0,
            }),
            started_generation: AtomicU64::new(0),
        }
    }

    pub fn engine(&self) -> &Engine<S> {
        &self.engine
    }

    /// A snapshot of the current cache.
    pub async fn cache(&self) -> ManufacturerCache {
        self.state.lock().await.cache.clone()
    }

    /// The most recently started generation. 0 before the first load.
    pub fn generation(&self) -> u64 {
        self.started_generation.load(Ordering::SeqCst)
    }

    /// Loads one page of `category` as of the current time.
    ///
    /// # Errors
    ///
    /// Propagates [`EngineError`] from [`Engine::reconcile`]. The cache is
    /// left untouched on error.
    pub async fn load(&self, category: &str, page: usize) -> Result<SessionPage, EngineError> {
        self.load_at(category, page, Utc::now()).await
    }

    /// Loads one page of `category` as of `now`.
    ///
    /// # Errors
    ///
    /// See [`Session::load`].
    pub async fn load_at(
        &self,
        category: &str,
        page: usize,
        now: DateTime<Utc>,
    ) -> Result<SessionPage, EngineError> {
        let (generation, snapshot) = self.begin().await;
        let reconciliation = self
            .engine
            .reconcile(category, page, &snapshot, now)
            .await?;
        let committed = self.commit(generation, &reconciliation).await;
        Ok(SessionPage {
            generation,
            committed,
            reconciliation,
        })
    }

    /// Forgets every cached manufacturer and loads `category` again, so all
    /// of its manufacturers are refetched.
    ///
    /// # Errors
    ///
    /// See [`Session::load`].
    pub async fn reload(&self, category: &str, page: usize) -> Result<SessionPage, EngineError> {
        self.clear().await;
        self.load(category, page).await
    }

    /// Empties the cache. Loads that started before this call can no longer
    /// commit.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        let generation = self.next_generation();
        state.cache = ManufacturerCache::new();
        state.committed_generation = state.committed_generation.max(generation);
        tracing::debug!(generation, "manufacturer cache cleared");
    }

    /// Only called with `state` locked, so generation order matches the order
    /// in which snapshots and clears are applied.
    fn next_generation(&self) -> u64 {
        self.started_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn begin(&self) -> (u64, ManufacturerCache) {
        let state = self.state.lock().await;
        (self.next_generation(), state.cache.clone())
    }

    /// Merges the manufacturers `reconciliation` refreshed into the current
    /// cache, unless a newer generation has already committed.
    async fn commit(&self, generation: u64, reconciliation: &Reconciliation) -> bool {
        let mut state = self.state.lock().await;
        if generation < state.committed_generation {
            tracing::debug!(
                generation,
                committed_generation = state.committed_generation,
                "discarding late reconciliation result"
            );
            return false;
        }

        let fresh: Vec<_> = reconciliation
            .refreshed
            .iter()
            .filter_map(|name| reconciliation.updated_cache.get(name).cloned())
            .collect();
        state.cache = state.cache.merge(fresh);
        state.committed_generation = generation;
        true
    }
}
