//! Commute risk scoring for a single forecast hour.
//!
//! Each factor adds a fixed number of points when its threshold is crossed:
//!
//! | factor     | trigger          | points |
//! |------------|------------------|--------|
//! | AQI        | US AQI >= 100    | 45     |
//! | rain       | probability > 60 | 30     |
//! | wind       | > 25 km/h        | 20     |
//! | visibility | < 2000 m         | 10     |
//! | temp       | < 5 °C           | 15     |
//!
//! The total is capped at 100.

use crate::model::{EnvironmentalPoint, RiskBreakdown, RiskEvaluation, RiskFactor};

pub const MAX_SCORE: u8 = 100;

pub const AQI_THRESHOLD: f64 = 100.0;
pub const RAIN_THRESHOLD_PCT: f64 = 60.0;
pub const WIND_THRESHOLD_KMH: f64 = 25.0;
pub const VISIBILITY_THRESHOLD_M: f64 = 2000.0;
pub const TEMPERATURE_THRESHOLD_C: f64 = 5.0;

/// Stand-in for missing visibility: effectively unlimited.
pub const VISIBILITY_DEFAULT_M: f64 = 999_999.0;
/// Stand-in for missing temperature: effectively warm.
pub const TEMPERATURE_DEFAULT_C: f64 = 999.0;

pub const NO_ISSUES_REASON: &str = "No major weather or AQ issues detected";

/// Readings after missing values were replaced with their no-risk defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringInputs {
    /// Missing AQI stays missing and never contributes.
    pub air_quality_index: Option<f64>,
    pub rain_probability: f64,
    pub wind_speed: f64,
    pub visibility: f64,
    pub temperature: f64,
}

impl ScoringInputs {
    pub fn from_point(point: &EnvironmentalPoint) -> Self {
        Self {
            air_quality_index: point.air_quality_index,
            rain_probability: point.rain_probability.unwrap_or(0.0),
            wind_speed: point.wind_speed.unwrap_or(0.0),
            visibility: point.visibility.unwrap_or(VISIBILITY_DEFAULT_M),
            temperature: point.temperature.unwrap_or(TEMPERATURE_DEFAULT_C),
        }
    }

    /// Reason text if `factor` triggers for these inputs.
    fn triggered(&self, factor: RiskFactor) -> Option<String> {
        match factor {
            RiskFactor::AirQuality => self
                .air_quality_index
                .filter(|aqi| *aqi >= AQI_THRESHOLD)
                .map(|aqi| format!("Poor air quality (US AQI {aqi})")),
            RiskFactor::Rain => (self.rain_probability > RAIN_THRESHOLD_PCT).then(|| {
                format!("High rain probability ({}%)", self.rain_probability.round())
            }),
            RiskFactor::Wind => (self.wind_speed > WIND_THRESHOLD_KMH)
                .then(|| format!("Strong winds ({} km/h)", self.wind_speed.round())),
            RiskFactor::Visibility => (self.visibility < VISIBILITY_THRESHOLD_M)
                .then(|| format!("Low visibility ({} km)", one_decimal(self.visibility / 1000.0))),
            RiskFactor::Temperature => (self.temperature < TEMPERATURE_THRESHOLD_C)
                .then(|| format!("Low temperature ({}°C)", one_decimal(self.temperature))),
        }
    }
}

/// One decimal place, with ties rounded away from zero (`1.25` -> `1.3`).
fn one_decimal(value: f64) -> String {
    format!("{:.1}", (value * 10.0).round() / 10.0)
}

/// Score one forecast hour. Pure and deterministic.
pub fn score(point: &EnvironmentalPoint) -> RiskEvaluation {
    score_inputs(&ScoringInputs::from_point(point))
}

pub fn score_inputs(inputs: &ScoringInputs) -> RiskEvaluation {
    let mut breakdown = RiskBreakdown::default();
    let mut reasons = Vec::new();

    for factor in RiskFactor::ALL {
        if let Some(reason) = inputs.triggered(factor) {
            breakdown.set(factor, factor.points());
            reasons.push(reason);
        }
    }

    if reasons.is_empty() {
        reasons.push(NO_ISSUES_REASON.to_string());
    }

    let score = breakdown.total().min(u16::from(MAX_SCORE)) as u8;

    RiskEvaluation { score, reasons, breakdown }
}
