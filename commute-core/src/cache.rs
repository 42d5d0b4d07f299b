//! Per-coordinate forecast cache.
//!
//! Entries are immutable `Arc<ForecastSeries>` values stamped with their
//! insertion time and considered fresh for `ttl`. Reading a fresh entry only
//! takes the shared read lock. On a miss, a per-key gate makes concurrent
//! callers for the same coordinate share a single upstream fetch. Every insert
//! first drops the entries that have already expired.

use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::{
    clock::Clock, forecast::ForecastSeries, model::Coordinate, model::EnvironmentalPoint,
    provider::ForecastProvider,
};

#[derive(Debug)]
struct CachedSeries {
    series: Arc<ForecastSeries>,
    inserted_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ForecastCache {
    provider: Arc<dyn ForecastProvider>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedSeries>>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ForecastCache {
    pub fn new(provider: Arc<dyn ForecastProvider>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            provider,
            clock,
            ttl,
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Readings for the hour containing `target` at `coord`.
    ///
    /// Falls back to the nearest cached hour when there is no exact match.
    /// Upstream failures are returned as errors, never as an empty point.
    pub async fn hourly_point(
        &self,
        coord: Coordinate,
        target: DateTime<Utc>,
    ) -> Result<EnvironmentalPoint> {
        let series = self.series(coord).await?;
        Ok(series.point_for(target))
    }

    /// The cached series for `coord`, fetching it if missing or expired.
    pub async fn series(&self, coord: Coordinate) -> Result<Arc<ForecastSeries>> {
        let key = coord.cache_key();

        if let Some(series) = self.fresh(&key).await {
            debug!(key = %key, "forecast cache hit");
            return Ok(series);
        }

        let gate = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(in_flight.entry(key.clone()).or_default())
        };

        let result = {
            let _fetching = gate.lock().await;
            self.fill(coord, &key).await
        };

        self.release_gate(&key, gate).await;
        result
    }

    /// Fetch and store the series for `key` unless a caller that held the gate
    /// before us already did.
    async fn fill(&self, coord: Coordinate, key: &str) -> Result<Arc<ForecastSeries>> {
        if let Some(series) = self.fresh(key).await {
            debug!(key = %key, "forecast cache filled by concurrent fetch");
            return Ok(series);
        }

        debug!(key = %key, "forecast cache miss, fetching");
        let series = Arc::new(self.provider.fetch_series(coord).await?);

        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let evicted = self.evict_expired(&mut entries, now);
        if evicted > 0 {
            debug!(evicted, "expired forecast entries dropped");
        }
        entries.insert(
            key.to_string(),
            CachedSeries { series: Arc::clone(&series), inserted_at: now },
        );

        Ok(series)
    }

    /// Drop the in-flight entry once no other caller is queued on `gate`.
    async fn release_gate(&self, key: &str, gate: Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().await;
        let ours = in_flight.get(key).is_some_and(|current| Arc::ptr_eq(current, &gate));
        // One reference in the map, one held here.
        if ours && Arc::strong_count(&gate) == 2 {
            in_flight.remove(key);
        }
    }

    pub async fn invalidate(&self, coord: Coordinate) {
        self.entries.write().await.remove(&coord.cache_key());
    }

    /// Drop every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        self.evict_expired(&mut entries, now)
    }

    fn evict_expired(
        &self,
        entries: &mut HashMap<String, CachedSeries>,
        now: DateTime<Utc>,
    ) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| self.is_fresh(entry, now));
        before - entries.len()
    }

    /// Number of stored entries, fresh or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn fresh(&self, key: &str) -> Option<Arc<ForecastSeries>> {
        let now = self.clock.now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| Arc::clone(&entry.series))
    }

    fn is_fresh(&self, entry: &CachedSeries, now: DateTime<Utc>) -> bool {
        match (now - entry.inserted_at).to_std() {
            Ok(age) => age < self.ttl,
            // Clock moved backwards; keep the entry.
            Err(_) => true,
        }
    }
}
