use std::{fmt, str::FromStr};

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check that both components are finite and within their ranges.
    pub fn validate(&self) -> Result<(), InputError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(InputError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(InputError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(InputError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }

    /// Cache key built from the exact float values; nearby points do not share a key.
    pub fn cache_key(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// Parses `"LAT,LON"` and validates the result.
impl FromStr for Coordinate {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || InputError::MalformedCoordinate(s.to_string());

        let (lat, lon) = s.split_once(',').ok_or_else(malformed)?;
        let latitude: f64 = lat.trim().parse().map_err(|_| malformed())?;
        let longitude: f64 = lon.trim().parse().map_err(|_| malformed())?;

        let coord = Coordinate::new(latitude, longitude);
        coord.validate()?;
        Ok(coord)
    }
}

/// Weather and air-quality readings for one forecast hour.
///
/// Every reading is optional: the upstream series may omit any of them.
/// Serialized with the field names of the public response payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalPoint {
    #[serde(rename = "time")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Air temperature at 2 m, °C.
    #[serde(rename = "temp")]
    pub temperature: Option<f64>,
    /// Precipitation probability, 0–100.
    #[serde(rename = "rain_prob")]
    pub rain_probability: Option<f64>,
    /// Wind speed at 10 m, km/h.
    pub wind_speed: Option<f64>,
    /// Visibility in meters.
    pub visibility: Option<f64>,
    #[serde(rename = "us_aqi")]
    pub air_quality_index: Option<f64>,
    pub pm2_5: Option<f64>,
}

/// The five factors contributing to a risk score, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskFactor {
    AirQuality,
    Rain,
    Wind,
    Visibility,
    Temperature,
}

impl RiskFactor {
    pub const ALL: [RiskFactor; 5] = [
        RiskFactor::AirQuality,
        RiskFactor::Rain,
        RiskFactor::Wind,
        RiskFactor::Visibility,
        RiskFactor::Temperature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFactor::AirQuality => "AQI",
            RiskFactor::Rain => "rain",
            RiskFactor::Wind => "wind",
            RiskFactor::Visibility => "visibility",
            RiskFactor::Temperature => "temp",
        }
    }

    /// Points added when the factor triggers.
    pub fn points(&self) -> u8 {
        match self {
            RiskFactor::AirQuality => 45,
            RiskFactor::Rain => 30,
            RiskFactor::Wind => 20,
            RiskFactor::Visibility => 10,
            RiskFactor::Temperature => 15,
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points contributed by each factor. Always carries all five factors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    #[serde(rename = "AQI")]
    pub air_quality: u8,
    pub rain: u8,
    pub wind: u8,
    pub visibility: u8,
    #[serde(rename = "temp")]
    pub temperature: u8,
}

impl RiskBreakdown {
    pub fn get(&self, factor: RiskFactor) -> u8 {
        match factor {
            RiskFactor::AirQuality => self.air_quality,
            RiskFactor::Rain => self.rain,
            RiskFactor::Wind => self.wind,
            RiskFactor::Visibility => self.visibility,
            RiskFactor::Temperature => self.temperature,
        }
    }

    pub(crate) fn set(&mut self, factor: RiskFactor, points: u8) {
        let slot = match factor {
            RiskFactor::AirQuality => &mut self.air_quality,
            RiskFactor::Rain => &mut self.rain,
            RiskFactor::Wind => &mut self.wind,
            RiskFactor::Visibility => &mut self.visibility,
            RiskFactor::Temperature => &mut self.temperature,
        };
        *slot = points;
    }

    pub fn entries(&self) -> [(RiskFactor, u8); 5] {
        RiskFactor::ALL.map(|factor| (factor, self.get(factor)))
    }

    /// Uncapped sum of all contributions.
    pub fn total(&self) -> u16 {
        self.entries().iter().map(|(_, points)| u16::from(*points)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvaluation {
    /// 0–100.
    pub score: u8,
    pub reasons: Vec<String>,
    pub breakdown: RiskBreakdown,
}

/// One sampled departure time. Lives for a single request.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateOffer {
    pub offset_minutes: i64,
    pub departure: DateTime<Utc>,
    pub point: EnvironmentalPoint,
    pub evaluation: RiskEvaluation,
}

impl CandidateOffer {
    pub fn score(&self) -> u8 {
        self.evaluation.score
    }
}

/// Summary of a candidate as surfaced in the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub shift_minutes: i64,
    pub departure: DateTime<Utc>,
    pub score: u8,
    pub reasons: Vec<String>,
}

impl From<&CandidateOffer> for Alternative {
    fn from(offer: &CandidateOffer) -> Self {
        Self {
            shift_minutes: offer.offset_minutes,
            departure: offer.departure,
            score: offer.evaluation.score,
            reasons: offer.evaluation.reasons.clone(),
        }
    }
}

/// Final answer for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Risk of the planned departure, not of the best alternative.
    pub risk_score: u8,
    #[serde(rename = "recommendation")]
    pub recommendation_text: String,
    pub recommended_departure: DateTime<Utc>,
    #[serde(rename = "reason")]
    pub reasons: Vec<String>,
    #[serde(rename = "risk_breakdown")]
    pub breakdown: RiskBreakdown,
    #[serde(rename = "weather_snapshot")]
    pub snapshot: EnvironmentalPoint,
    /// All candidates, sorted by ascending score then offset.
    pub alternatives: Vec<Alternative>,
}

/// When the commuter intends to leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Departure {
    #[default]
    Now,
    At(DateTime<FixedOffset>),
}

impl Departure {
    pub const LEAVE_NOW: &'static str = "leave now";

    /// Accepts `"leave now"`, an RFC 3339 timestamp, or a naive
    /// `YYYY-MM-DDTHH:MM[:SS]` timestamp read in the local timezone.
    ///
    /// A naive time that falls in a DST gap or overlap is rejected.
    pub fn parse(s: &str) -> Result<Self, InputError> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(Self::LEAVE_NOW) {
            return Ok(Departure::Now);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Departure::At(dt));
        }

        ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
            .and_then(|naive| Local.from_local_datetime(&naive).single())
            .map(|local| Departure::At(local.fixed_offset()))
            .ok_or_else(|| InputError::InvalidDeparture(s.to_string()))
    }
}

impl FromStr for Departure {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Departure::parse(s)
    }
}

/// Default trip duration; accepted but not used by scoring.
pub const DEFAULT_DURATION_MINUTES: u32 = 45;

#[derive(Debug, Clone, PartialEq)]
pub struct CommuteRequest {
    pub home: Coordinate,
    pub office: Coordinate,
    pub planned_departure: Departure,
    pub duration_minutes: u32,
}

impl CommuteRequest {
    pub fn new(home: Coordinate, office: Coordinate) -> Self {
        Self {
            home,
            office,
            planned_departure: Departure::Now,
            duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }

    pub fn departing(mut self, departure: Departure) -> Self {
        self.planned_departure = departure;
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn validate(&self) -> Result<(), InputError> {
        self.home.validate()?;
        self.office.validate()
    }
}
