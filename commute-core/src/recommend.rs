use anyhow::{Result, anyhow};

use crate::model::{Alternative, CandidateOffer, Recommendation};

/// A better candidate must beat the planned score by more than this to be suggested.
pub const SHIFT_MARGIN: u8 = 5;

pub const NO_CHANGE: &str = "No change needed";

/// Pick the planned (offset 0) offer out of a sorted candidate list and decide.
pub fn recommend(sorted_offers: &[CandidateOffer]) -> Result<Recommendation> {
    let planned = sorted_offers
        .iter()
        .find(|offer| offer.offset_minutes == 0)
        .ok_or_else(|| anyhow!("Candidate list has no offer for the planned departure"))?;

    Ok(decide(sorted_offers, planned))
}

/// Decide whether to suggest leaving at another time.
///
/// `sorted_offers` must be ordered best first. A shift is suggested only when
/// `best.score + SHIFT_MARGIN < planned.score`. The headline risk, reasons,
/// breakdown and snapshot always describe the planned departure.
pub fn decide(sorted_offers: &[CandidateOffer], planned: &CandidateOffer) -> Recommendation {
    let best = sorted_offers.first().unwrap_or(planned);

    let shift = u16::from(best.score()) + u16::from(SHIFT_MARGIN) < u16::from(planned.score());

    let (recommendation_text, recommended_departure) = if shift {
        (shift_text(best.offset_minutes), best.departure)
    } else {
        (NO_CHANGE.to_string(), planned.departure)
    };

    Recommendation {
        risk_score: planned.score(),
        recommendation_text,
        recommended_departure,
        reasons: planned.evaluation.reasons.clone(),
        breakdown: planned.evaluation.breakdown,
        snapshot: planned.point.clone(),
        alternatives: sorted_offers.iter().map(Alternative::from).collect(),
    }
}

fn shift_text(offset_minutes: i64) -> String {
    let minutes = offset_minutes.unsigned_abs();
    if offset_minutes < 0 {
        format!("Leave {minutes} minutes earlier")
    } else {
        format!("Leave {minutes} minutes later")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        candidates::sort_offers,
        model::{EnvironmentalPoint, RiskBreakdown, RiskEvaluation},
        test_support::start_time,
    };
    use chrono::TimeDelta;

    fn offer(offset_minutes: i64, score: u8) -> CandidateOffer {
        CandidateOffer {
            offset_minutes,
            departure: start_time() + TimeDelta::minutes(offset_minutes),
            point: EnvironmentalPoint {
                timestamp: Some(start_time() + TimeDelta::minutes(offset_minutes)),
                ..EnvironmentalPoint::default()
            },
            evaluation: RiskEvaluation {
                score,
                reasons: vec![format!("score {score}")],
                breakdown: RiskBreakdown::default(),
            },
        }
    }

    fn sorted(mut offers: Vec<CandidateOffer>) -> Vec<CandidateOffer> {
        sort_offers(&mut offers);
        offers
    }

    #[test]
    fn clear_improvement_suggests_leaving_earlier() {
        let offers = sorted(vec![
            offer(-120, 90),
            offer(-60, 70),
            offer(0, 80),
            offer(60, 85),
            offer(120, 95),
        ]);
        let rec = recommend(&offers).unwrap();

        assert_eq!(rec.recommendation_text, "Leave 60 minutes earlier");
        assert_eq!(rec.recommended_departure, start_time() - TimeDelta::minutes(60));
        assert_eq!(rec.risk_score, 80);
        assert_eq!(rec.reasons, vec!["score 80"]);
        assert_eq!(rec.snapshot.timestamp, Some(start_time()));
    }

    #[test]
    fn margin_boundary_is_strict() {
        let offers = sorted(vec![
            offer(-120, 90),
            offer(-60, 76),
            offer(0, 80),
            offer(60, 85),
            offer(120, 95),
        ]);
        let rec = recommend(&offers).unwrap();
        assert_eq!(rec.recommendation_text, NO_CHANGE);
        assert_eq!(rec.recommended_departure, start_time());

        // 75 + 5 == 80 is still not enough.
        let offers = sorted(vec![offer(-60, 75), offer(0, 80)]);
        assert_eq!(recommend(&offers).unwrap().recommendation_text, NO_CHANGE);

        let offers = sorted(vec![offer(-60, 74), offer(0, 80)]);
        assert_eq!(
            recommend(&offers).unwrap().recommendation_text,
            "Leave 60 minutes earlier"
        );
    }

    #[test]
    fn later_departure_text() {
        let offers = sorted(vec![
            offer(-120, 60),
            offer(-60, 60),
            offer(0, 60),
            offer(60, 30),
            offer(120, 0),
        ]);
        let rec = recommend(&offers).unwrap();
        assert_eq!(rec.recommendation_text, "Leave 120 minutes later");
        assert_eq!(rec.recommended_departure, start_time() + TimeDelta::minutes(120));
    }

    #[test]
    fn planned_offer_that_is_best_never_shifts() {
        let offers = sorted(vec![offer(-60, 10), offer(0, 0), offer(60, 10)]);
        let rec = recommend(&offers).unwrap();
        assert_eq!(rec.recommendation_text, NO_CHANGE);
        assert_eq!(rec.risk_score, 0);
    }

    #[test]
    fn alternatives_keep_sorted_order() {
        let offers = sorted(vec![offer(120, 0), offer(0, 30), offer(-120, 0)]);
        let rec = recommend(&offers).unwrap();
        let shifts: Vec<i64> = rec.alternatives.iter().map(|a| a.shift_minutes).collect();
        assert_eq!(shifts, vec![-120, 120, 0]);
        assert_eq!(rec.recommendation_text, "Leave 120 minutes earlier");
    }

    #[test]
    fn missing_planned_offer_is_an_error() {
        let err = recommend(&[offer(60, 10)]).unwrap_err();
        assert!(err.to_string().contains("planned departure"));
    }

    #[test]
    fn serializes_with_response_field_names() {
        let offers = sorted(vec![offer(0, 0)]);
        let value = serde_json::to_value(recommend(&offers).unwrap()).unwrap();
        for key in [
            "risk_score",
            "recommendation",
            "recommended_departure",
            "reason",
            "risk_breakdown",
            "weather_snapshot",
            "alternatives",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["alternatives"][0]["shift_minutes"], 0);
        assert!(value["weather_snapshot"].get("us_aqi").is_some());
    }
}
