use std::sync::Arc;

use tracing::info;

use crate::{
    Config,
    cache::ForecastCache,
    candidates::CandidateEvaluator,
    clock::{Clock, SystemClock},
    error::AdviceError,
    geo,
    model::{CommuteRequest, Departure, Recommendation},
    provider::{ForecastProvider, provider_from_config},
    recommend,
};

/// Entry point: turns a commute request into a departure recommendation.
///
/// Holds the process-wide forecast cache, so one advisor should be built and
/// reused across requests.
#[derive(Debug, Clone)]
pub struct CommuteAdvisor {
    evaluator: CandidateEvaluator,
    clock: Arc<dyn Clock>,
}

impl CommuteAdvisor {
    pub fn new(cache: Arc<ForecastCache>, clock: Arc<dyn Clock>) -> Self {
        Self { evaluator: CandidateEvaluator::new(cache), clock }
    }

    /// Wire a provider, clock and cache together using the config's TTL.
    pub fn with_provider(
        provider: Arc<dyn ForecastProvider>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        let cache = ForecastCache::new(provider, Arc::clone(&clock), config.cache_ttl());
        Self::new(Arc::new(cache), clock)
    }

    /// Open-Meteo provider and the system clock.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        Ok(Self::with_provider(provider, Arc::new(SystemClock), config))
    }

    pub async fn advise(&self, request: &CommuteRequest) -> Result<Recommendation, AdviceError> {
        request.validate()?;

        let planned = match request.planned_departure {
            Departure::Now => self.clock.now().fixed_offset(),
            Departure::At(at) => at,
        };
        let midpoint = geo::midpoint(request.home, request.office);

        let offers = self.evaluator.evaluate(midpoint, planned).await?;
        let recommendation = recommend::recommend(&offers)?;

        info!(
            %midpoint,
            planned = %planned,
            risk_score = recommendation.risk_score,
            recommendation = %recommendation.recommendation_text,
            "commute advice computed"
        );

        Ok(recommendation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        error::InputError,
        model::Coordinate,
        test_support::{CountingProvider, hourly_series, start_time},
    };
    use chrono::TimeDelta;

    fn advisor(provider: Arc<CountingProvider>, clock: Arc<ManualClock>) -> CommuteAdvisor {
        CommuteAdvisor::with_provider(provider, clock, &Config::default())
    }

    fn request() -> CommuteRequest {
        CommuteRequest::new(Coordinate::new(52.50, 13.30), Coordinate::new(52.54, 13.50))
    }

    #[tokio::test]
    async fn invalid_coordinates_are_rejected_before_fetching() {
        let provider = Arc::new(CountingProvider::new(hourly_series(48)));
        let clock = Arc::new(ManualClock::new(start_time()));
        let advisor = advisor(provider.clone(), clock);

        let bad = CommuteRequest::new(Coordinate::new(95.0, 0.0), Coordinate::new(0.0, 0.0));
        let err = advisor.advise(&bad).await.unwrap_err();

        assert!(err.is_input());
        assert!(matches!(err, AdviceError::Input(InputError::LatitudeOutOfRange(_))));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn leave_now_uses_injected_clock() {
        let provider = Arc::new(CountingProvider::new(hourly_series(48)));
        let clock = Arc::new(ManualClock::new(start_time() + TimeDelta::minutes(5 * 60 + 35)));
        let advisor = advisor(provider, clock);

        let rec = advisor.advise(&request()).await.unwrap();

        // Temperatures equal the hour index, so 05:00 and earlier are cold.
        assert_eq!(rec.snapshot.timestamp, Some(start_time() + TimeDelta::hours(5)));
        assert_eq!(rec.risk_score, 0);
        assert_eq!(rec.recommended_departure, start_time() + TimeDelta::hours(5));
        assert_eq!(rec.alternatives.len(), 5);
    }

    #[tokio::test]
    async fn cold_planned_hour_suggests_waiting() {
        let provider = Arc::new(CountingProvider::new(hourly_series(48)));
        let clock = Arc::new(ManualClock::new(start_time()));
        let advisor = advisor(provider, clock);

        let planned = (start_time() + TimeDelta::hours(4)).fixed_offset();
        let rec = advisor
            .advise(&request().departing(Departure::At(planned)))
            .await
            .unwrap();

        assert_eq!(rec.risk_score, 15);
        assert_eq!(rec.reasons, vec!["Low temperature (4.0°C)"]);
        assert_eq!(rec.recommendation_text, "Leave 60 minutes later");
        assert_eq!(rec.recommended_departure, start_time() + TimeDelta::hours(5));
    }

    #[tokio::test]
    async fn repeated_requests_reuse_cached_forecast() {
        let provider = Arc::new(CountingProvider::new(hourly_series(48)));
        let clock = Arc::new(ManualClock::new(start_time()));
        let advisor = advisor(provider.clone(), clock.clone());
        let req = request().departing(Departure::At((start_time() + TimeDelta::hours(8)).fixed_offset()));

        let first = advisor.advise(&req).await.unwrap();
        clock.advance(TimeDelta::seconds(30));
        let second = advisor.advise(&req).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn upstream_failure_fails_the_request() {
        let provider = Arc::new(CountingProvider::failing("forecast request failed with status 500"));
        let clock = Arc::new(ManualClock::new(start_time()));
        let advisor = advisor(provider, clock);

        let err = advisor.advise(&request()).await.unwrap_err();
        assert!(!err.is_input());
        assert!(err.to_string().contains("status 500"));
    }
}
