//! Taxi demand engine
//!
//! This module turns weather and traffic snapshots into:
//! - Per-zone demand predictions ranked by AI-adjusted revenue
//! - Driver repositioning recommendations
//! - Passenger take-a-taxi / wait / alternative advice
//!
//! [`DemandEngine`] is the only entry point; it owns the zone catalog and the
//! scoring tables and holds no mutable state, so one instance can be shared
//! across threads and called concurrently.

mod driver;
mod multipliers;
mod passenger;
mod ranker;

use chrono::NaiveDateTime;
use tracing::instrument;

use crate::config::ScoringConfig;
use crate::error::DemandError;
use crate::models::{TrafficSnapshot, WeatherSnapshot, ZoneCatalog};

pub use driver::DriverRecommendation;
pub use multipliers::{Multipliers, RainTier};
pub use passenger::{
    CurrentConditions, DecisionReason, ForecastPoint, ModeEstimate, PassengerAdvice, TravelDecision,
    TravelMode, WeatherProtection, WeatherTimeline,
};
pub use ranker::{DemandPrediction, PerformanceComparison, ScoringConditions};

/// Scoring and decision engine over a fixed zone catalog
#[derive(Debug, Clone, Default)]
pub struct DemandEngine {
    catalog: ZoneCatalog,
    config: ScoringConfig,
}

impl DemandEngine {
    /// Create an engine without validating the scoring tables
    #[must_use]
    pub fn new(catalog: ZoneCatalog, config: ScoringConfig) -> Self {
        Self { catalog, config }
    }

    /// Create an engine, rejecting invalid scoring tables
    pub fn try_new(catalog: ZoneCatalog, config: ScoringConfig) -> Result<Self, DemandError> {
        config.validate()?;
        Ok(Self::new(catalog, config))
    }

    #[must_use]
    pub fn catalog(&self) -> &ZoneCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score every zone, best AI-adjusted revenue first
    #[instrument(level = "debug", skip_all, fields(clock = %clock))]
    pub fn rank_zones(
        &self,
        weather: &WeatherSnapshot,
        traffic: &TrafficSnapshot,
        clock: NaiveDateTime,
    ) -> Vec<DemandPrediction> {
        ranker::rank_zones(&self.catalog, &self.config, weather, traffic, clock)
    }

    /// At most five repositioning recommendations from ranked predictions
    #[instrument(level = "debug", skip_all, fields(predictions = ranked.len()))]
    pub fn driver_recommendations(&self, ranked: &[DemandPrediction]) -> Vec<DriverRecommendation> {
        driver::driver_recommendations(ranked, &self.config)
    }

    /// Transportation advice for a trip; `None` means no weather is available
    #[instrument(level = "debug", skip(self, weather))]
    pub fn passenger_advice(
        &self,
        weather: Option<&WeatherSnapshot>,
        origin: &str,
        destination: &str,
    ) -> PassengerAdvice {
        passenger::passenger_advice(weather, origin, destination, &self.catalog, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_new_rejects_invalid_tables() {
        let mut config = ScoringConfig::default();
        config.weather.light_multiplier = f64::NAN;
        let result = DemandEngine::try_new(ZoneCatalog::tokyo(), config);
        assert!(matches!(result, Err(DemandError::Config { .. })));
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DemandEngine>();
    }

    #[test]
    fn test_default_engine_uses_tokyo_catalog() {
        let engine = DemandEngine::default();
        assert_eq!(engine.catalog().len(), 10);
        assert_eq!(engine.config(), &ScoringConfig::default());
    }
}
