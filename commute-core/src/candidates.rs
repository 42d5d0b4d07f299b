use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use tokio::task::JoinSet;

use crate::{
    cache::ForecastCache,
    clock::truncate_to_hour,
    model::{CandidateOffer, Coordinate},
    scoring,
};

/// Departure shifts sampled around the planned hour, in minutes.
pub const CANDIDATE_OFFSETS_MINUTES: [i64; 5] = [-120, -60, 0, 60, 120];

/// Samples and scores the candidate departures around a planned trip.
#[derive(Debug, Clone)]
pub struct CandidateEvaluator {
    cache: Arc<ForecastCache>,
}

impl CandidateEvaluator {
    pub fn new(cache: Arc<ForecastCache>) -> Self {
        Self { cache }
    }

    /// Score every candidate departure for `coord`.
    ///
    /// Candidates are evaluated concurrently. The first failure fails the whole
    /// evaluation and aborts the candidates still running. The result is sorted
    /// by ascending score, then ascending offset.
    pub async fn evaluate(
        &self,
        coord: Coordinate,
        planned: DateTime<FixedOffset>,
    ) -> Result<Vec<CandidateOffer>> {
        let planned_hour = truncate_to_hour(planned).with_timezone(&Utc);

        let mut tasks = JoinSet::new();
        for offset_minutes in CANDIDATE_OFFSETS_MINUTES {
            let cache = Arc::clone(&self.cache);
            tasks.spawn(async move {
                let departure = planned_hour + TimeDelta::minutes(offset_minutes);
                let point = cache.hourly_point(coord, departure).await?;
                let evaluation = scoring::score(&point);
                anyhow::Ok(CandidateOffer { offset_minutes, departure, point, evaluation })
            });
        }

        let mut offers = Vec::with_capacity(CANDIDATE_OFFSETS_MINUTES.len());
        while let Some(joined) = tasks.join_next().await {
            // Returning early drops `tasks`, which aborts the remaining candidates.
            let offer = joined.context("Candidate evaluation task panicked or was cancelled")??;
            offers.push(offer);
        }

        sort_offers(&mut offers);
        Ok(offers)
    }
}

/// Ascending score; ties go to the earlier offset.
pub fn sort_offers(offers: &mut [CandidateOffer]) {
    offers.sort_by_key(|offer| (offer.evaluation.score, offer.offset_minutes));
}
