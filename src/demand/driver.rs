//! Driver repositioning recommendations

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use super::ranker::DemandPrediction;
use crate::config::{MAX_RECOMMENDATIONS, ScoringConfig};

/// Advice to reposition towards a zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverRecommendation {
    pub zone_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub expected_demand_increase_pct: f64,
    /// Extra revenue attributable to AI-guided positioning, in percent
    pub expected_revenue_boost: f64,
    pub ai_revenue_per_min: f64,
    pub confidence: f64,
    pub time_to_position_minutes: u32,
    pub reasoning: String,
    /// Weather condition that drives the recommendation
    pub weather_trigger: String,
}

/// Turn ranked predictions into at most five repositioning recommendations.
///
/// Only zones whose expected demand increase exceeds the configured threshold
/// qualify; the result is ordered by revenue boost, ties by zone name. An
/// empty result means there is no actionable opportunity right now.
#[must_use]
pub fn driver_recommendations(
    predictions: &[DemandPrediction],
    config: &ScoringConfig,
) -> Vec<DriverRecommendation> {
    let policy = &config.recommendation;
    let boost_factor = config.performance.ai_uplift_factor - 1.0;

    let mut recommendations: Vec<DriverRecommendation> = predictions
        .iter()
        .filter(|p| p.expected_increase_pct > policy.min_increase_pct)
        .map(|p| DriverRecommendation {
            zone_name: p.zone.name.clone(),
            latitude: p.zone.latitude,
            longitude: p.zone.longitude,
            expected_demand_increase_pct: p.expected_increase_pct,
            expected_revenue_boost: p.expected_increase_pct * boost_factor,
            ai_revenue_per_min: p.ai_revenue_per_min(),
            confidence: p.confidence_score,
            time_to_position_minutes: policy.base_travel_minutes + p.zone.travel_offset_minutes,
            reasoning: demand_reasoning(p, config),
            weather_trigger: weather_trigger(p),
        })
        .collect();

    debug!(
        candidates = predictions.len(),
        qualifying = recommendations.len(),
        threshold = policy.min_increase_pct,
        "Filtered driver recommendations"
    );

    recommendations.sort_by(compare_recommendations);
    recommendations.truncate(policy.max_recommendations.min(MAX_RECOMMENDATIONS));
    recommendations
}

fn compare_recommendations(a: &DriverRecommendation, b: &DriverRecommendation) -> Ordering {
    b.expected_revenue_boost
        .total_cmp(&a.expected_revenue_boost)
        .then_with(|| a.zone_name.cmp(&b.zone_name))
}

fn demand_reasoning(prediction: &DemandPrediction, config: &ScoringConfig) -> String {
    let conditions = &prediction.conditions;
    let mut reasons = Vec::new();

    if conditions.rain_tier.is_rain() {
        reasons.push(format!(
            "{} rain increasing taxi demand by {:.1}x",
            conditions.rain_tier, prediction.multipliers.weather
        ));
    }

    if prediction.zone.is_transit_hub {
        reasons.push(format!("{} is a high-traffic transit hub", prediction.zone.name));
    }

    if config.temporal.morning_rush.contains(conditions.hour) {
        reasons.push("morning rush hour traffic".to_string());
    } else if config.temporal.evening_rush.contains(conditions.hour) {
        reasons.push("evening rush hour traffic".to_string());
    }

    if prediction.expected_increase_pct > config.recommendation.high_opportunity_pct {
        reasons.push("HIGH OPPORTUNITY ZONE".to_string());
    }

    if reasons.is_empty() {
        reasons.push("demand above the city baseline".to_string());
    }

    if conditions.fallback_data {
        reasons.push("estimated from fallback data".to_string());
    }

    reasons.join(" • ")
}

fn weather_trigger(prediction: &DemandPrediction) -> String {
    format!(
        "{} (Intensity: {:.1}mm/h)",
        prediction.conditions.weather_description, prediction.conditions.precipitation_mm_h
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::ranker::rank_zones;
    use crate::models::{TrafficSnapshot, WeatherSnapshot, Zone, ZoneCatalog};
    use chrono::{NaiveDate, NaiveDateTime};

    fn weekday_clock(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 5)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn rank(weather: &WeatherSnapshot, hour: u32) -> Vec<DemandPrediction> {
        rank_zones(
            &ZoneCatalog::tokyo(),
            &ScoringConfig::default(),
            weather,
            &TrafficSnapshot::default(),
            weekday_clock(hour),
        )
    }

    #[test]
    fn test_capped_at_five() {
        let predictions = rank(&WeatherSnapshot::default().with_precipitation(8.0), 18);
        let recommendations = driver_recommendations(&predictions, &ScoringConfig::default());

        assert_eq!(recommendations.len(), 5);
        assert_eq!(recommendations[0].zone_name, "Tokyo Station");
        for pair in recommendations.windows(2) {
            assert!(pair[0].expected_revenue_boost >= pair[1].expected_revenue_boost);
        }
    }

    #[test]
    fn test_nothing_clears_threshold_at_night() {
        let predictions = rank(&WeatherSnapshot::default(), 3);
        let recommendations = driver_recommendations(&predictions, &ScoringConfig::default());
        assert!(recommendations.is_empty());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        // location factor 1.25 at 16:00 on a dry weekday is exactly +25%
        let catalog = ZoneCatalog::new(vec![
            Zone::new("Edge", 35.68, 139.76, 50.0, 1.25),
            Zone::new("Over", 35.69, 139.77, 50.0, 1.26),
        ]);
        let predictions = rank_zones(
            &catalog,
            &ScoringConfig::default(),
            &WeatherSnapshot::default(),
            &TrafficSnapshot::default(),
            weekday_clock(16),
        );
        let recommendations = driver_recommendations(&predictions, &ScoringConfig::default());

        let names: Vec<&str> = recommendations.iter().map(|r| r.zone_name.as_str()).collect();
        assert_eq!(names, vec!["Over"]);
    }

    #[test]
    fn test_travel_time_is_stable_per_zone() {
        let predictions = rank(&WeatherSnapshot::default().with_precipitation(3.0), 18);
        let first = driver_recommendations(&predictions, &ScoringConfig::default());
        let second = driver_recommendations(&predictions, &ScoringConfig::default());

        assert_eq!(first, second);
        let tokyo = first.iter().find(|r| r.zone_name == "Tokyo Station").unwrap();
        assert_eq!(tokyo.time_to_position_minutes, 21);
    }

    #[test]
    fn test_reasoning_lists_triggers() {
        let predictions = rank(&WeatherSnapshot::default().with_precipitation(8.0), 8);
        let recommendations = driver_recommendations(&predictions, &ScoringConfig::default());
        let shinjuku = recommendations.iter().find(|r| r.zone_name == "Shinjuku").unwrap();

        assert!(shinjuku.reasoning.contains("heavy rain increasing taxi demand by 3.1x"));
        assert!(shinjuku.reasoning.contains("Shinjuku is a high-traffic transit hub"));
        assert!(shinjuku.reasoning.contains("morning rush hour traffic"));
        assert!(shinjuku.reasoning.contains("HIGH OPPORTUNITY ZONE"));
        assert_eq!(shinjuku.weather_trigger, "Partly Cloudy (Intensity: 8.0mm/h)");
    }

    #[test]
    fn test_fallback_data_is_flagged_in_reasoning() {
        let predictions = rank(&WeatherSnapshot::fallback(), 18);
        let recommendations = driver_recommendations(&predictions, &ScoringConfig::default());

        assert!(!recommendations.is_empty());
        assert!(recommendations.iter().all(|r| r.reasoning.contains("fallback data")));
        assert!(recommendations.iter().all(|r| r.confidence == 75.0));
    }

    #[test]
    fn test_revenue_boost_uses_uplift() {
        let predictions = rank(&WeatherSnapshot::default().with_precipitation(3.0), 12);
        let recommendations = driver_recommendations(&predictions, &ScoringConfig::default());

        for recommendation in &recommendations {
            let expected = recommendation.expected_demand_increase_pct * 0.302;
            assert!((recommendation.expected_revenue_boost - expected).abs() < 1e-9);
        }
    }
}
