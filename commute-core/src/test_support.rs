//! Fakes shared by the unit tests.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::{forecast::ForecastSeries, model::Coordinate, provider::ForecastProvider};

pub(crate) fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
}

/// `hours` consecutive hours from `start_time()`, temperature equal to the hour index.
pub(crate) fn hourly_series(hours: usize) -> ForecastSeries {
    ForecastSeries {
        times: (0..hours)
            .map(|h| start_time() + TimeDelta::hours(h as i64))
            .collect(),
        temperature: Some((0..hours).map(|h| Some(h as f64)).collect()),
        ..ForecastSeries::default()
    }
}

/// Provider returning a fixed series and counting how often it was asked.
#[derive(Debug)]
pub(crate) struct CountingProvider {
    series: Option<ForecastSeries>,
    error: Option<String>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl CountingProvider {
    pub(crate) fn new(series: ForecastSeries) -> Self {
        Self {
            series: Some(series),
            error: None,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            series: None,
            error: Some(message.to_string()),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most fetches ever running at the same time.
    pub(crate) fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastProvider for CountingProvider {
    async fn fetch_series(&self, _coord: Coordinate) -> Result<ForecastSeries> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        match (&self.series, &self.error) {
            (Some(series), _) => Ok(series.clone()),
            (None, Some(message)) => Err(anyhow!(message.clone())),
            (None, None) => Err(anyhow!("no series configured")),
        }
    }
}
