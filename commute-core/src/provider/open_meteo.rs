use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::{fmt, time::Duration};
use tracing::{debug, warn};

use crate::{Config, forecast::ForecastSeries, model::Coordinate};

use super::ForecastProvider;

const WEATHER_VARIABLES: &str = "temperature_2m,precipitation_probability,windspeed_10m,visibility";
const AIR_QUALITY_VARIABLES: &str = "us_aqi,pm2_5";

/// Open-Meteo forecast + air-quality client.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    weather_url: String,
    air_quality_url: String,
    forecast_days: u8,
    timezone: String,
    retry_attempts: u32,
    retry_backoff: Duration,
}

#[derive(Debug, Clone, Copy)]
enum Upstream {
    Weather,
    AirQuality,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Upstream::Weather => "forecast",
            Upstream::AirQuality => "air-quality",
        })
    }
}

/// A failed attempt, and whether trying again could help.
struct AttemptFailure {
    error: anyhow::Error,
    retryable: bool,
}

impl OpenMeteoProvider {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            weather_url: config.weather_url.clone(),
            air_quality_url: config.air_quality_url.clone(),
            forecast_days: config.forecast_days,
            timezone: config.timezone.clone(),
            retry_attempts: config.retry_attempts,
            retry_backoff: config.retry_backoff(),
        })
    }

    async fn fetch_weather(&self, coord: Coordinate) -> Result<OmWeatherResponse> {
        let body = self
            .get_with_retry(Upstream::Weather, &self.weather_url, coord, WEATHER_VARIABLES)
            .await?;

        serde_json::from_str(&body).context("Failed to parse Open-Meteo forecast JSON")
    }

    async fn fetch_air_quality(&self, coord: Coordinate) -> Result<OmAirQualityResponse> {
        let body = self
            .get_with_retry(Upstream::AirQuality, &self.air_quality_url, coord, AIR_QUALITY_VARIABLES)
            .await?;

        serde_json::from_str(&body).context("Failed to parse Open-Meteo air-quality JSON")
    }

    async fn get_with_retry(
        &self,
        upstream: Upstream,
        url: &str,
        coord: Coordinate,
        hourly: &str,
    ) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.get_once(upstream, url, coord, hourly).await {
                Ok(body) => return Ok(body),
                Err(failure) if failure.retryable && attempt < self.retry_attempts => {
                    attempt += 1;
                    warn!(
                        %upstream,
                        attempt,
                        error = %failure.error,
                        "Open-Meteo request failed, retrying"
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    async fn get_once(
        &self,
        upstream: Upstream,
        url: &str,
        coord: Coordinate,
        hourly: &str,
    ) -> std::result::Result<String, AttemptFailure> {
        let res = self
            .http
            .get(url)
            .query(&[
                ("latitude", coord.latitude.to_string()),
                ("longitude", coord.longitude.to_string()),
                ("hourly", hourly.to_string()),
                ("forecast_days", self.forecast_days.to_string()),
                ("timezone", self.timezone.clone()),
            ])
            .send()
            .await
            .map_err(|e| AttemptFailure {
                error: anyhow::Error::new(e)
                    .context(format!("Failed to send request to Open-Meteo ({upstream})")),
                retryable: true,
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| AttemptFailure {
            error: anyhow::Error::new(e)
                .context(format!("Failed to read Open-Meteo {upstream} response body")),
            retryable: true,
        })?;

        if !status.is_success() {
            return Err(AttemptFailure {
                error: anyhow!(
                    "Open-Meteo {} request failed with status {}: {}",
                    upstream,
                    status,
                    truncate_body(&body),
                ),
                retryable: status.is_server_error(),
            });
        }

        Ok(body)
    }
}

#[derive(Debug, Default, Deserialize)]
struct OmWeatherHourly {
    #[serde(default)]
    time: Vec<String>,
    temperature_2m: Option<Vec<Option<f64>>>,
    precipitation_probability: Option<Vec<Option<f64>>>,
    windspeed_10m: Option<Vec<Option<f64>>>,
    visibility: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct OmWeatherResponse {
    #[serde(default)]
    utc_offset_seconds: i32,
    hourly: Option<OmWeatherHourly>,
}

#[derive(Debug, Default, Deserialize)]
struct OmAirQualityHourly {
    us_aqi: Option<Vec<Option<f64>>>,
    pm2_5: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct OmAirQualityResponse {
    hourly: Option<OmAirQualityHourly>,
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    async fn fetch_series(&self, coord: Coordinate) -> Result<ForecastSeries> {
        debug!(%coord, "fetching Open-Meteo forecast and air quality");

        let (weather, air) =
            tokio::try_join!(self.fetch_weather(coord), self.fetch_air_quality(coord))?;

        merge(weather, air)
    }
}

/// Join both responses into one series. Rows are aligned by index with the
/// forecast's time column.
///
/// Every hour is converted with the single `utc_offset_seconds` of the
/// response. This is a known approximation: when the horizon crosses a DST
/// change, the hours after the change come out one hour off.
fn merge(weather: OmWeatherResponse, air: OmAirQualityResponse) -> Result<ForecastSeries> {
    let utc_offset = FixedOffset::east_opt(weather.utc_offset_seconds).ok_or_else(|| {
        anyhow!(
            "Open-Meteo returned an invalid UTC offset: {}s",
            weather.utc_offset_seconds
        )
    })?;

    let hourly = weather.hourly.unwrap_or_default();
    let air = air.hourly.unwrap_or_default();

    let times = hourly
        .time
        .iter()
        .map(|raw| parse_local_hour(raw, utc_offset))
        .collect::<Result<Vec<_>>>()?;

    Ok(ForecastSeries {
        utc_offset,
        times,
        temperature: hourly.temperature_2m,
        rain_probability: hourly.precipitation_probability,
        wind_speed: hourly.windspeed_10m,
        visibility: hourly.visibility,
        air_quality_index: air.us_aqi,
        pm2_5: air.pm2_5,
    })
}

/// Open-Meteo reports local wall-clock hours like `2024-01-01T08:00`.
fn parse_local_hour(raw: &str, offset: FixedOffset) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .with_context(|| format!("Invalid time '{raw}' in Open-Meteo response"))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("Ambiguous local time '{raw}' in Open-Meteo response"))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
