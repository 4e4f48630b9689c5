//! Multiplier calculator
//!
//! Turns a snapshot and a clock time into independent demand multipliers.
//! Every function here is total and deterministic, and never returns a
//! negative value.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{DisruptionTable, ScoringConfig, TemporalTable, WeatherTable};
use crate::models::{Disruption, TrafficSnapshot, WeatherSnapshot};

/// Precipitation intensity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RainTier {
    None,
    Light,
    Moderate,
    Heavy,
}

impl RainTier {
    /// Classify a precipitation rate. Each tier includes its upper bound.
    #[must_use]
    pub fn classify(precipitation_mm_h: f64, table: &WeatherTable) -> Self {
        // NaN lands here too
        if !(precipitation_mm_h > 0.0) {
            RainTier::None
        } else if precipitation_mm_h <= table.light_rain_max_mm {
            RainTier::Light
        } else if precipitation_mm_h <= table.heavy_rain_min_mm {
            RainTier::Moderate
        } else {
            RainTier::Heavy
        }
    }

    #[must_use]
    pub fn is_rain(self) -> bool {
        self != RainTier::None
    }
}

impl fmt::Display for RainTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RainTier::None => write!(f, "no"),
            RainTier::Light => write!(f, "light"),
            RainTier::Moderate => write!(f, "moderate"),
            RainTier::Heavy => write!(f, "heavy"),
        }
    }
}

/// The three independent multipliers used for one scoring call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multipliers {
    pub weather: f64,
    pub temporal: f64,
    pub disruption: f64,
}

impl Multipliers {
    #[must_use]
    pub fn compute(
        weather: &WeatherSnapshot,
        traffic: &TrafficSnapshot,
        clock: NaiveDateTime,
        config: &ScoringConfig,
    ) -> Self {
        Self {
            weather: weather_multiplier(weather, &config.weather),
            temporal: temporal_multiplier(clock.hour(), clock.weekday(), &config.temporal),
            disruption: disruption_multiplier(&traffic.disruptions, &config.disruption),
        }
    }

    /// Product of all three multipliers
    #[must_use]
    pub fn combined(&self) -> f64 {
        non_negative(self.weather * self.temporal * self.disruption)
    }
}

/// Clamp into `[0, f64::MAX]`; NaN counts as zero and overflow saturates
pub(crate) fn non_negative(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, f64::MAX) }
}

/// Weather demand multiplier from rain tier and temperature extremes
#[must_use]
pub fn weather_multiplier(weather: &WeatherSnapshot, table: &WeatherTable) -> f64 {
    let mut multiplier = match RainTier::classify(weather.precipitation(), table) {
        RainTier::None => 1.0,
        RainTier::Light => table.light_multiplier,
        RainTier::Moderate => table.moderate_multiplier,
        RainTier::Heavy => table.heavy_multiplier,
    };

    let temperature = weather.temperature();
    if temperature < table.extreme_cold_below_c || temperature > table.extreme_heat_above_c {
        multiplier *= table.extreme_temperature_multiplier;
    }

    non_negative(multiplier)
}

/// Hour-of-day multiplier, stacked with the weekend multiplier on Saturday and Sunday
#[must_use]
pub fn temporal_multiplier(hour: u32, weekday: Weekday, table: &TemporalTable) -> f64 {
    let mut multiplier = table.hourly[(hour % 24) as usize];

    if matches!(weekday, Weekday::Sat | Weekday::Sun) {
        multiplier *= table.weekend_multiplier;
    }

    non_negative(multiplier)
}

/// Compounded boost from active disruptions, one factor per delayed disruption
#[must_use]
pub fn disruption_multiplier(disruptions: &[Disruption], table: &DisruptionTable) -> f64 {
    let multiplier = disruptions
        .iter()
        .filter(|d| d.estimated_delay_minutes > 0)
        .fold(1.0, |acc, d| {
            acc * (1.0 + f64::from(d.estimated_delay_minutes) * table.per_minute_boost)
        });

    non_negative(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[rstest]
    #[case(0.0, RainTier::None)]
    #[case(0.2, RainTier::Light)]
    #[case(1.0, RainTier::Light)]
    #[case(1.01, RainTier::Moderate)]
    #[case(5.0, RainTier::Moderate)]
    #[case(5.01, RainTier::Heavy)]
    #[case(42.0, RainTier::Heavy)]
    #[case(-1.0, RainTier::None)]
    #[case(f64::NAN, RainTier::None)]
    fn test_rain_tier_boundaries(#[case] precipitation: f64, #[case] expected: RainTier) {
        assert_eq!(RainTier::classify(precipitation, &WeatherTable::default()), expected);
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(0.5, 1.8)]
    #[case(3.0, 2.4)]
    #[case(8.0, 3.1)]
    fn test_weather_multiplier_tiers(#[case] precipitation: f64, #[case] expected: f64) {
        let weather = WeatherSnapshot::default().with_precipitation(precipitation);
        assert!(approx(weather_multiplier(&weather, &WeatherTable::default()), expected));
    }

    #[test]
    fn test_weather_multiplier_at_least_one_when_raining() {
        let table = WeatherTable::default();
        for tenth in 0..=300 {
            let precipitation = f64::from(tenth) / 10.0;
            let weather = WeatherSnapshot::default().with_precipitation(precipitation);
            let multiplier = weather_multiplier(&weather, &table);
            if precipitation > 0.0 {
                assert!(multiplier >= 1.0, "{precipitation} mm/h gave {multiplier}");
            } else {
                assert_eq!(multiplier, 1.0);
            }
        }
    }

    #[rstest]
    #[case(4.9, 1.4)]
    #[case(5.0, 1.0)]
    #[case(35.0, 1.0)]
    #[case(35.1, 1.4)]
    fn test_extreme_temperature_penalty(#[case] temperature: f64, #[case] expected: f64) {
        let weather = WeatherSnapshot::default().with_temperature(temperature);
        assert!(approx(weather_multiplier(&weather, &WeatherTable::default()), expected));
    }

    #[test]
    fn test_extreme_temperature_stacks_with_rain() {
        let weather = WeatherSnapshot::default()
            .with_precipitation(8.0)
            .with_temperature(2.0);
        assert!(approx(weather_multiplier(&weather, &WeatherTable::default()), 3.1 * 1.4));
    }

    #[test]
    fn test_temporal_table_is_total() {
        let table = TemporalTable::default();
        for hour in 0..24 {
            let multiplier = temporal_multiplier(hour, Weekday::Wed, &table);
            assert!(multiplier.is_finite() && multiplier >= 0.0);
        }
        assert_eq!(
            temporal_multiplier(24, Weekday::Wed, &table),
            temporal_multiplier(0, Weekday::Wed, &table)
        );
    }

    #[test]
    fn test_rush_hour_beats_night_trough() {
        let table = TemporalTable::default();
        let rush = temporal_multiplier(18, Weekday::Tue, &table);
        let trough = temporal_multiplier(3, Weekday::Tue, &table);
        assert!(rush > trough);

        let peak = (0..24)
            .max_by(|a, b| table.hourly[*a].total_cmp(&table.hourly[*b]))
            .unwrap();
        assert!(table.evening_rush.contains(peak as u32));
    }

    #[test]
    fn test_weekend_multiplier_stacks() {
        let table = TemporalTable::default();
        let weekday = temporal_multiplier(12, Weekday::Fri, &table);
        let weekend = temporal_multiplier(12, Weekday::Sat, &table);
        assert!(approx(weekend, weekday * 1.2));
    }

    #[test]
    fn test_disruption_multiplier_compounds() {
        let table = DisruptionTable::default();
        assert_eq!(disruption_multiplier(&[], &table), 1.0);

        let disruptions = vec![
            Disruption::new("JR Yamanote", Severity::Medium, 10),
            Disruption::new("Tokyo Metro Ginza", Severity::High, 20),
            Disruption::new("Tokyo Metro Hibiya", Severity::Low, 0),
        ];
        assert!(approx(disruption_multiplier(&disruptions, &table), 1.1 * 1.2));
    }

    #[test]
    fn test_extreme_disruptions_saturate() {
        let table = DisruptionTable::default();
        let disruptions: Vec<Disruption> = (0..60)
            .map(|i| Disruption::new(format!("Line {i}"), Severity::High, u32::MAX))
            .collect();

        let multiplier = disruption_multiplier(&disruptions, &table);
        assert_eq!(multiplier, f64::MAX);

        let multipliers = Multipliers {
            weather: 3.1,
            temporal: 1.5,
            disruption: multiplier,
        };
        assert_eq!(multipliers.combined(), f64::MAX);
    }

    #[test]
    fn test_negative_table_values_clamp_to_zero() {
        let table = WeatherTable {
            heavy_multiplier: -2.0,
            ..WeatherTable::default()
        };
        let weather = WeatherSnapshot::default().with_precipitation(9.0);
        assert_eq!(weather_multiplier(&weather, &table), 0.0);
    }

    #[test]
    fn test_compute_combines_all_three() {
        // 2024-06-07 is a Friday
        let clock = NaiveDate::from_ymd_opt(2024, 6, 7)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();
        let weather = WeatherSnapshot::default().with_precipitation(3.0);
        let traffic = TrafficSnapshot::from_observations(
            Vec::new(),
            vec![Disruption::new("JR Yamanote", Severity::Medium, 10)],
        );

        let multipliers =
            Multipliers::compute(&weather, &traffic, clock, &ScoringConfig::default());

        assert!(approx(multipliers.weather, 2.4));
        assert!(approx(multipliers.temporal, 1.5));
        assert!(approx(multipliers.disruption, 1.1));
        assert!(approx(multipliers.combined(), 2.4 * 1.5 * 1.1));
    }
}
