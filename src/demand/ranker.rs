//! Demand ranker
//!
//! Combines the multipliers with each zone's base values into one
//! [`DemandPrediction`] per zone and orders them by AI-adjusted revenue.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use super::multipliers::{Multipliers, RainTier, non_negative};
use crate::config::{
    CONFIDENCE_CEILING, CONFIDENCE_FLOOR, ConfidenceModel, PerformanceModel, ScoringConfig,
};
use crate::models::{TrafficSnapshot, WeatherSnapshot, Zone, ZoneCatalog};

/// AI-guided versus baseline performance for one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceComparison {
    pub ai_revenue_per_min: f64,
    pub baseline_revenue_per_min: f64,
    pub improvement_pct: f64,
    pub ai_wait_minutes: f64,
    pub baseline_wait_minutes: f64,
    pub ai_utilization_pct: f64,
    pub baseline_utilization_pct: f64,
}

/// Conditions a prediction was scored under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConditions {
    pub rain_tier: RainTier,
    pub precipitation_mm_h: f64,
    pub weather_description: String,
    pub hour: u32,
    pub is_weekend: bool,
    pub has_disruptions: bool,
    /// Weather provider confidence, 0.0-1.0
    pub weather_confidence: f64,
    /// Either snapshot was a provider fallback
    pub fallback_data: bool,
}

/// Predicted demand for one zone at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandPrediction {
    pub zone: Zone,
    pub multipliers: Multipliers,
    /// Base revenue scaled by all multipliers
    pub demand_score: f64,
    /// Location factor scaled by all multipliers; 1.0 is an average zone in neutral conditions
    pub demand_index: f64,
    /// Demand index relative to the 1.0 baseline, in percent
    pub expected_increase_pct: f64,
    pub performance: PerformanceComparison,
    /// Always within [70, 95] with the default confidence model
    pub confidence_score: f64,
    pub conditions: ScoringConditions,
}

impl DemandPrediction {
    #[must_use]
    pub fn ai_revenue_per_min(&self) -> f64 {
        self.performance.ai_revenue_per_min
    }
}

/// Score every zone in the catalog, best AI-adjusted revenue first.
///
/// Equal revenues are ordered by zone name ascending. An empty catalog
/// yields an empty list.
#[must_use]
pub fn rank_zones(
    catalog: &ZoneCatalog,
    config: &ScoringConfig,
    weather: &WeatherSnapshot,
    traffic: &TrafficSnapshot,
    clock: NaiveDateTime,
) -> Vec<DemandPrediction> {
    let multipliers = Multipliers::compute(weather, traffic, clock, config);
    let confidence_score = confidence_score(weather, traffic, &config.confidence);
    let conditions = ScoringConditions {
        rain_tier: RainTier::classify(weather.precipitation(), &config.weather),
        precipitation_mm_h: weather.precipitation(),
        weather_description: weather.description.clone(),
        hour: clock.hour(),
        is_weekend: matches!(clock.weekday(), Weekday::Sat | Weekday::Sun),
        has_disruptions: traffic.has_disruptions(),
        weather_confidence: weather.confidence(),
        fallback_data: weather.is_fallback() || traffic.is_fallback(),
    };

    debug!(
        zones = catalog.len(),
        weather = multipliers.weather,
        temporal = multipliers.temporal,
        disruption = multipliers.disruption,
        "Ranking zones"
    );

    let mut predictions: Vec<DemandPrediction> = catalog
        .iter()
        .map(|zone| {
            predict_zone(zone, multipliers, confidence_score, &conditions, &config.performance)
        })
        .collect();

    predictions.sort_by(compare_predictions);
    predictions
}

fn compare_predictions(a: &DemandPrediction, b: &DemandPrediction) -> Ordering {
    b.ai_revenue_per_min()
        .total_cmp(&a.ai_revenue_per_min())
        .then_with(|| a.zone.name.cmp(&b.zone.name))
}

fn predict_zone(
    zone: &Zone,
    multipliers: Multipliers,
    confidence_score: f64,
    conditions: &ScoringConditions,
    model: &PerformanceModel,
) -> DemandPrediction {
    let demand_score = non_negative(zone.base_revenue_per_min * multipliers.combined());
    let demand_index = non_negative(zone.location_factor * multipliers.combined());

    DemandPrediction {
        zone: zone.clone(),
        multipliers,
        demand_score,
        demand_index,
        expected_increase_pct: ((demand_index - 1.0) * 100.0).min(f64::MAX),
        performance: compare_performance(demand_score, model),
        confidence_score,
        conditions: conditions.clone(),
    }
}

/// AI revenue scales the baseline by the uplift factor and the AI wait time
/// shrinks inversely with it; AI utilisation is the reference rate plus the
/// configured gain, capped at 100%.
#[must_use]
pub fn compare_performance(demand_score: f64, model: &PerformanceModel) -> PerformanceComparison {
    let uplift = model.ai_uplift_factor;
    let utilization_gain = 1.0 + model.ai_utilization_gain_pct / 100.0;

    PerformanceComparison {
        ai_revenue_per_min: non_negative(demand_score * uplift),
        baseline_revenue_per_min: demand_score,
        improvement_pct: (uplift - 1.0) * 100.0,
        ai_wait_minutes: model.ai_reference_wait_minutes / uplift,
        baseline_wait_minutes: model.baseline_wait_minutes,
        ai_utilization_pct: (model.ai_reference_utilization_pct * utilization_gain).min(100.0),
        baseline_utilization_pct: model.baseline_utilization_pct,
    }
}

/// Confidence from data quality, clamped into the model's bounds
#[must_use]
pub fn confidence_score(
    weather: &WeatherSnapshot,
    traffic: &TrafficSnapshot,
    model: &ConfidenceModel,
) -> f64 {
    let mut score = model.base;

    if weather.is_raining() {
        score += model.rain_bonus;
    }
    if traffic.has_disruptions() {
        score += model.disruption_bonus;
    }
    if weather.is_fallback() || traffic.is_fallback() {
        score -= model.fallback_penalty;
    }

    score
        .max(model.min)
        .min(model.max)
        .max(CONFIDENCE_FLOOR)
        .min(CONFIDENCE_CEILING)
}
