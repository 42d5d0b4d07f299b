use std::fmt;

use chrono::{DateTime, Local, Utc};
use commute_core::{EnvironmentalPoint, Recommendation};

/// Human-readable summary of a recommendation.
pub struct Report<'a>(pub &'a Recommendation);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rec = self.0;

        writeln!(f, "Planned departure risk: {}/100", rec.risk_score)?;
        for reason in &rec.reasons {
            writeln!(f, "  - {reason}")?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "Recommendation: {} (depart {})",
            rec.recommendation_text,
            local_time(rec.recommended_departure)
        )?;

        writeln!(f)?;
        writeln!(f, "Conditions at planned hour:")?;
        write!(f, "{}", Snapshot(&rec.snapshot))?;

        writeln!(f)?;
        writeln!(f, "{:>6}  {:<16}  {:>5}", "shift", "departure", "score")?;
        for alt in &rec.alternatives {
            writeln!(
                f,
                "{:>+6}  {:<16}  {:>5}",
                alt.shift_minutes,
                local_time(alt.departure),
                alt.score
            )?;
        }

        Ok(())
    }
}

struct Snapshot<'a>(&'a EnvironmentalPoint);

impl fmt::Display for Snapshot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let point = self.0;
        let rows = [
            ("temperature", point.temperature, "°C"),
            ("rain", point.rain_probability, "%"),
            ("wind", point.wind_speed, " km/h"),
            ("visibility", point.visibility.map(|m| m / 1000.0), " km"),
            ("US AQI", point.air_quality_index, ""),
            ("PM2.5", point.pm2_5, " µg/m³"),
        ];

        for (label, value, unit) in rows {
            match value {
                Some(v) => writeln!(f, "  {label:<12} {v:.1}{unit}")?,
                None => writeln!(f, "  {label:<12} n/a")?,
            }
        }
        Ok(())
    }
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
