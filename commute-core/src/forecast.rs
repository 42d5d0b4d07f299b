use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::{clock::truncate_to_hour, model::EnvironmentalPoint};

/// Hourly weather and air-quality data for one coordinate.
///
/// Stored column-wise as delivered by the provider: one time column plus one
/// column per reading. A column may be absent as a whole, shorter than the
/// time column, or hold gaps; each degrades to `None` independently.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    /// Offset the provider reported its local hours in.
    pub utc_offset: FixedOffset,
    pub times: Vec<DateTime<Utc>>,
    pub temperature: Option<Vec<Option<f64>>>,
    pub rain_probability: Option<Vec<Option<f64>>>,
    pub wind_speed: Option<Vec<Option<f64>>>,
    pub visibility: Option<Vec<Option<f64>>>,
    pub air_quality_index: Option<Vec<Option<f64>>>,
    pub pm2_5: Option<Vec<Option<f64>>>,
}

impl Default for ForecastSeries {
    fn default() -> Self {
        Self {
            utc_offset: Utc.fix(),
            times: Vec::new(),
            temperature: None,
            rain_probability: None,
            wind_speed: None,
            visibility: None,
            air_quality_index: None,
            pm2_5: None,
        }
    }
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Index of the hour serving `target`.
    ///
    /// `target` is truncated to its hour in the series' offset. An exact match
    /// wins; otherwise the closest hour by absolute distance, earliest index on
    /// ties. Empty series resolve to index 0.
    pub fn resolve_index(&self, target: DateTime<Utc>) -> usize {
        let hour = truncate_to_hour(target.with_timezone(&self.utc_offset)).with_timezone(&Utc);

        if let Some(idx) = self.times.iter().position(|t| *t == hour) {
            return idx;
        }

        self.times
            .iter()
            .enumerate()
            .min_by_key(|(_, t)| (**t - hour).num_milliseconds().abs())
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }

    /// Readings at `idx`; every field missing from its column comes back as `None`.
    pub fn point_at(&self, idx: usize) -> EnvironmentalPoint {
        EnvironmentalPoint {
            timestamp: self.times.get(idx).copied(),
            temperature: value_at(&self.temperature, idx),
            rain_probability: value_at(&self.rain_probability, idx),
            wind_speed: value_at(&self.wind_speed, idx),
            visibility: value_at(&self.visibility, idx),
            air_quality_index: value_at(&self.air_quality_index, idx),
            pm2_5: value_at(&self.pm2_5, idx),
        }
    }

    pub fn point_for(&self, target: DateTime<Utc>) -> EnvironmentalPoint {
        self.point_at(self.resolve_index(target))
    }
}

fn value_at(column: &Option<Vec<Option<f64>>>, idx: usize) -> Option<f64> {
    column.as_ref()?.get(idx).copied().flatten()
}
