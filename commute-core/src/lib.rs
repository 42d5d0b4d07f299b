//! Core library for the `commute` departure advisor.
//!
//! This crate defines:
//! - Configuration & upstream provider settings
//! - The Open-Meteo forecast provider and the per-coordinate forecast cache
//! - Risk scoring, candidate evaluation and the recommendation policy
//!
//! It is used by `commute-cli`, but can also be reused by other binaries or services.

pub mod advisor;
pub mod cache;
pub mod candidates;
pub mod clock;
pub mod config;
pub mod error;
pub mod forecast;
pub mod geo;
pub mod model;
pub mod provider;
pub mod recommend;
pub mod scoring;

#[cfg(test)]
pub(crate) mod test_support;

pub use advisor::CommuteAdvisor;
pub use cache::ForecastCache;
pub use candidates::CandidateEvaluator;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{AdviceError, InputError};
pub use forecast::ForecastSeries;
pub use model::{
    Alternative, CandidateOffer, CommuteRequest, Coordinate, Departure, EnvironmentalPoint,
    Recommendation, RiskBreakdown, RiskEvaluation, RiskFactor,
};
pub use provider::{ForecastProvider, OpenMeteoProvider};
