//! Taxi demand scoring engine
//!
//! This library turns weather and transit snapshots into ranked per-zone
//! demand predictions, driver repositioning recommendations and passenger
//! travel advice.

pub mod config;
pub mod demand;
pub mod error;
pub mod logging;
pub mod models;
pub mod providers;

// Re-export core types for public API
pub use config::{AppConfig, ScoringConfig};
pub use demand::{
    DemandEngine, DemandPrediction, DriverRecommendation, PassengerAdvice, TravelDecision,
};
pub use error::DemandError;
pub use models::{TrafficSnapshot, WeatherSnapshot, Zone, ZoneCatalog};
pub use providers::{
    JsonFileProvider, Snapshots, StaticProvider, TrafficProvider, WeatherProvider,
    acquire_snapshots,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, DemandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
