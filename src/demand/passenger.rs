//! Passenger decision engine
//!
//! Decides between taking a taxi now, waiting for rain to stop, or using an
//! alternative, from the current rain and the one-hour rain probability.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::config::{ModeTariff, PassengerPolicy, ScoringConfig};
use crate::models::{WeatherSnapshot, ZoneCatalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelDecision {
    TakeTaxiNow,
    #[serde(rename = "wait_rain_stops")]
    WaitForRainToStop,
    UseAlternative,
}

/// Which rule produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    HeavyRain,
    RainContinuing,
    GoodConditions,
    RainClearing,
    FavorReliability,
    WeatherUnavailable,
}

impl DecisionReason {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            DecisionReason::HeavyRain => {
                "Heavy rain makes taxi the best option for comfort and time"
            }
            DecisionReason::RainContinuing => {
                "Rain expected to continue - taxi recommended for dry travel"
            }
            DecisionReason::GoodConditions => {
                "Good weather conditions - train or walking are viable options"
            }
            DecisionReason::RainClearing => {
                "Rain likely to stop soon - consider waiting for alternatives"
            }
            DecisionReason::FavorReliability => "Weather conditions favor taxi for reliability",
            DecisionReason::WeatherUnavailable => {
                "Weather data unavailable - taxi recommended for reliability"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    pub decision: TravelDecision,
    pub reason: DecisionReason,
    pub wait_minutes: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Taxi,
    Train,
    Walking,
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TravelMode::Taxi => write!(f, "Taxi"),
            TravelMode::Train => write!(f, "Train"),
            TravelMode::Walking => write!(f, "Walking"),
        }
    }
}

/// How well a mode keeps the passenger dry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherProtection {
    Full,
    Partial,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeEstimate {
    pub mode: TravelMode,
    pub cost_yen: f64,
    pub time_minutes: f64,
    pub weather_protection: WeatherProtection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub condition: String,
    pub raining: bool,
    pub intensity_mm_h: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub rain_probability: f64,
    pub condition: String,
}

/// Weather the decision was based on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherTimeline {
    pub current: CurrentConditions,
    pub one_hour: Option<ForecastPoint>,
    pub three_hour: Option<ForecastPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerAdvice {
    pub origin: String,
    pub destination: String,
    pub decision: TravelDecision,
    pub reason: DecisionReason,
    pub reasoning: String,
    pub wait_time_estimate_minutes: Option<u32>,
    pub distance_km: f64,
    /// Taxi, train and walking, in that order
    pub modes: Vec<ModeEstimate>,
    pub weather_timeline: WeatherTimeline,
    pub confidence: f64,
}

impl PassengerAdvice {
    #[must_use]
    pub fn mode(&self, mode: TravelMode) -> Option<&ModeEstimate> {
        self.modes.iter().find(|m| m.mode == mode)
    }
}

/// The decision table. Rules are evaluated in order and the first match wins;
/// the final rule catches everything the others leave open, including rain
/// with a one-hour probability between the clearing and continuing thresholds.
#[must_use]
pub fn decide(
    is_raining: bool,
    rain_intensity_mm_h: f64,
    rain_probability_1h: f64,
    heavy_rain_min_mm: f64,
    policy: &PassengerPolicy,
) -> DecisionOutcome {
    let (decision, reason, wait_minutes) = if rain_intensity_mm_h > heavy_rain_min_mm {
        (TravelDecision::TakeTaxiNow, DecisionReason::HeavyRain, None)
    } else if is_raining && rain_probability_1h > policy.continue_probability_pct {
        (TravelDecision::TakeTaxiNow, DecisionReason::RainContinuing, None)
    } else if !is_raining && rain_probability_1h < policy.clear_probability_pct {
        (TravelDecision::UseAlternative, DecisionReason::GoodConditions, None)
    } else if is_raining && rain_probability_1h < policy.clearing_probability_pct {
        (
            TravelDecision::WaitForRainToStop,
            DecisionReason::RainClearing,
            Some(policy.wait_minutes),
        )
    } else {
        (TravelDecision::TakeTaxiNow, DecisionReason::FavorReliability, None)
    };

    DecisionOutcome {
        decision,
        reason,
        wait_minutes,
    }
}

/// Advise a passenger travelling from `origin` to `destination`.
///
/// A missing or fallback weather snapshot yields a taxi recommendation at the
/// lower fallback confidence.
#[must_use]
pub fn passenger_advice(
    weather: Option<&WeatherSnapshot>,
    origin: &str,
    destination: &str,
    catalog: &ZoneCatalog,
    config: &ScoringConfig,
) -> PassengerAdvice {
    let policy = &config.passenger;
    let distance_km = trip_distance(origin, destination, catalog, policy);
    debug!(origin, destination, distance_km, "Generating passenger advice");

    let Some(weather) = weather.filter(|w| !w.is_fallback()) else {
        warn!("No live weather available, using fallback passenger advice");
        return fallback_advice(origin, destination, distance_km, policy);
    };

    let raining = weather.is_raining();
    let outcome = decide(
        raining,
        weather.precipitation(),
        weather.forecast.probability_1h(),
        config.weather.heavy_rain_min_mm,
        policy,
    );

    let reasoning = match outcome.wait_minutes {
        Some(minutes) => format!("{} (about {minutes} minutes)", outcome.reason.message()),
        None => outcome.reason.message().to_string(),
    };

    PassengerAdvice {
        origin: origin.to_string(),
        destination: destination.to_string(),
        decision: outcome.decision,
        reason: outcome.reason,
        reasoning,
        wait_time_estimate_minutes: outcome.wait_minutes,
        distance_km,
        modes: mode_estimates(distance_km, raining, policy),
        weather_timeline: weather_timeline(weather),
        confidence: policy.confidence,
    }
}

fn fallback_advice(
    origin: &str,
    destination: &str,
    distance_km: f64,
    policy: &PassengerPolicy,
) -> PassengerAdvice {
    let reason = DecisionReason::WeatherUnavailable;

    PassengerAdvice {
        origin: origin.to_string(),
        destination: destination.to_string(),
        decision: TravelDecision::TakeTaxiNow,
        reason,
        reasoning: reason.message().to_string(),
        wait_time_estimate_minutes: None,
        distance_km,
        modes: mode_estimates(distance_km, false, policy),
        weather_timeline: WeatherTimeline {
            current: CurrentConditions {
                condition: "unknown".to_string(),
                raining: false,
                intensity_mm_h: 0.0,
            },
            one_hour: None,
            three_hour: None,
        },
        confidence: policy.fallback_confidence,
    }
}

/// Distance between two catalog zones, or the default trip length when either
/// end is not a known zone
fn trip_distance(
    origin: &str,
    destination: &str,
    catalog: &ZoneCatalog,
    policy: &PassengerPolicy,
) -> f64 {
    match (catalog.find(origin), catalog.find(destination)) {
        (Some(from), Some(to)) => {
            let km = from.distance_km(to);
            if km > 0.0 { km } else { policy.default_distance_km }
        }
        _ => policy.default_distance_km,
    }
}

fn estimate(
    mode: TravelMode,
    tariff: &ModeTariff,
    distance_km: f64,
    raining: bool,
    protection: WeatherProtection,
) -> ModeEstimate {
    let mut cost_yen = tariff.flat_cost_yen + tariff.cost_per_km_yen * distance_km;
    let mut time_minutes = tariff.minutes_per_km * distance_km;

    if raining {
        cost_yen += tariff.rain_surcharge_yen;
        time_minutes += tariff.rain_delay_minutes;
    }

    ModeEstimate {
        mode,
        cost_yen,
        time_minutes,
        weather_protection: protection,
    }
}

fn mode_estimates(distance_km: f64, raining: bool, policy: &PassengerPolicy) -> Vec<ModeEstimate> {
    vec![
        estimate(TravelMode::Taxi, &policy.taxi, distance_km, raining, WeatherProtection::Full),
        estimate(
            TravelMode::Train,
            &policy.train,
            distance_km,
            raining,
            WeatherProtection::Partial,
        ),
        estimate(
            TravelMode::Walking,
            &policy.walking,
            distance_km,
            raining,
            WeatherProtection::None,
        ),
    ]
}

fn weather_timeline(weather: &WeatherSnapshot) -> WeatherTimeline {
    WeatherTimeline {
        current: CurrentConditions {
            condition: weather.description.clone(),
            raining: weather.is_raining(),
            intensity_mm_h: weather.precipitation(),
        },
        one_hour: Some(ForecastPoint {
            rain_probability: weather.forecast.probability_1h(),
            condition: weather.forecast.conditions.clone(),
        }),
        three_hour: Some(ForecastPoint {
            rain_probability: weather.forecast.probability_3h(),
            condition: "improving".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn decide_default(is_raining: bool, intensity: f64, probability: f64) -> DecisionOutcome {
        decide(is_raining, intensity, probability, 5.0, &PassengerPolicy::default())
    }

    #[rstest]
    #[case(true, 8.0, 20.0, TravelDecision::TakeTaxiNow, DecisionReason::HeavyRain)]
    #[case(true, 2.0, 75.0, TravelDecision::TakeTaxiNow, DecisionReason::RainContinuing)]
    #[case(false, 0.0, 10.0, TravelDecision::UseAlternative, DecisionReason::GoodConditions)]
    #[case(true, 2.0, 35.0, TravelDecision::WaitForRainToStop, DecisionReason::RainClearing)]
    #[case(true, 2.0, 50.0, TravelDecision::TakeTaxiNow, DecisionReason::FavorReliability)]
    #[case(false, 0.0, 45.0, TravelDecision::TakeTaxiNow, DecisionReason::FavorReliability)]
    #[case(true, 5.0, 60.0, TravelDecision::TakeTaxiNow, DecisionReason::FavorReliability)]
    #[case(true, 5.0, 40.0, TravelDecision::TakeTaxiNow, DecisionReason::FavorReliability)]
    #[case(false, 0.0, 30.0, TravelDecision::TakeTaxiNow, DecisionReason::FavorReliability)]
    fn test_decision_table(
        #[case] is_raining: bool,
        #[case] intensity: f64,
        #[case] probability: f64,
        #[case] decision: TravelDecision,
        #[case] reason: DecisionReason,
    ) {
        let outcome = decide_default(is_raining, intensity, probability);
        assert_eq!(outcome.decision, decision);
        assert_eq!(outcome.reason, reason);
    }

    #[test]
    fn test_every_input_has_a_decision() {
        for raining in [false, true] {
            for probability in 0..=100 {
                for intensity in [0.0, 0.5, 5.0, 5.5, 20.0] {
                    let outcome = decide_default(raining, intensity, f64::from(probability));
                    assert_eq!(
                        outcome.wait_minutes.is_some(),
                        outcome.decision == TravelDecision::WaitForRainToStop
                    );
                }
            }
        }
    }

    #[test]
    fn test_wait_estimate_is_positive() {
        let outcome = decide_default(true, 2.0, 35.0);
        assert_eq!(outcome.wait_minutes, Some(45));
    }

    #[test]
    fn test_rain_surcharge_and_delay() {
        let weather = WeatherSnapshot::default()
            .with_precipitation(2.0)
            .with_rain_probability_1h(50.0);
        let advice = passenger_advice(
            Some(&weather),
            "Hotel",
            "Office",
            &ZoneCatalog::tokyo(),
            &ScoringConfig::default(),
        );

        let taxi = advice.mode(TravelMode::Taxi).unwrap();
        assert_eq!(taxi.cost_yen, 2200.0);
        assert_eq!(taxi.time_minutes, 20.0);
        let train = advice.mode(TravelMode::Train).unwrap();
        assert_eq!(train.cost_yen, 200.0);
        assert_eq!(train.time_minutes, 20.0);
        let walking = advice.mode(TravelMode::Walking).unwrap();
        assert_eq!(walking.cost_yen, 0.0);
        assert_eq!(walking.time_minutes, 70.0);
        assert_eq!(advice.confidence, 0.85);
    }

    #[test]
    fn test_dry_trip_between_zones_uses_distance() {
        let weather = WeatherSnapshot::default().with_rain_probability_1h(10.0);
        let advice = passenger_advice(
            Some(&weather),
            "Shibuya",
            "Shinjuku",
            &ZoneCatalog::tokyo(),
            &ScoringConfig::default(),
        );

        assert_eq!(advice.decision, TravelDecision::UseAlternative);
        assert!(advice.distance_km > 3.0 && advice.distance_km < 4.0);
        let taxi = advice.mode(TravelMode::Taxi).unwrap();
        assert!((taxi.cost_yen - advice.distance_km * 400.0).abs() < 1e-9);
        assert_eq!(advice.weather_timeline.three_hour.as_ref().unwrap().rain_probability, 0.0);
    }

    #[test]
    fn test_missing_weather_falls_back() {
        let advice = passenger_advice(
            None,
            "Ginza",
            "Ueno",
            &ZoneCatalog::tokyo(),
            &ScoringConfig::default(),
        );
        assert_eq!(advice.decision, TravelDecision::TakeTaxiNow);
        assert_eq!(advice.reason, DecisionReason::WeatherUnavailable);
        assert_eq!(advice.confidence, 0.60);
        assert_eq!(advice.weather_timeline.current.condition, "unknown");
        assert!(advice.weather_timeline.one_hour.is_none());
    }

    #[test]
    fn test_fallback_snapshot_is_treated_as_unavailable() {
        let fallback = WeatherSnapshot::fallback();
        let advice = passenger_advice(
            Some(&fallback),
            "Hotel",
            "Office",
            &ZoneCatalog::tokyo(),
            &ScoringConfig::default(),
        );

        assert_eq!(advice.reason, DecisionReason::WeatherUnavailable);
        assert_eq!(advice.confidence, 0.60);
        let costs: Vec<f64> = advice.modes.iter().map(|m| m.cost_yen).collect();
        assert_eq!(costs, vec![2000.0, 200.0, 0.0]);
    }

    #[test]
    fn test_decision_serializes_with_snake_case_labels() {
        assert_eq!(
            serde_json::to_string(&TravelDecision::WaitForRainToStop).unwrap(),
            "\"wait_rain_stops\""
        );
        assert_eq!(
            serde_json::to_string(&TravelDecision::TakeTaxiNow).unwrap(),
            "\"take_taxi_now\""
        );
    }
}
