use crate::{Config, forecast::ForecastSeries, model::Coordinate};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod open_meteo;

pub use open_meteo::OpenMeteoProvider;

/// Upstream source of hourly weather and air-quality forecasts.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    /// Fetch the merged hourly series for `coord`.
    ///
    /// Weather and air quality are fetched together; if either fails the whole
    /// call fails and nothing is returned.
    async fn fetch_series(&self, coord: Coordinate) -> anyhow::Result<ForecastSeries>;
}

/// Construct the forecast provider described by the config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn ForecastProvider>> {
    config.validate()?;
    let provider = OpenMeteoProvider::from_config(config)?;
    Ok(Arc::new(provider))
}
