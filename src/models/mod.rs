//! Data models for the taxi demand engine
//!
//! This module contains the engine inputs organized by concern:
//! - Weather: the current weather snapshot and its near-term rain forecast
//! - Traffic: transit station status and active disruptions
//! - Zone: the fixed catalog of scored city areas

pub mod traffic;
pub mod weather;
pub mod zone;

use serde::{Deserialize, Serialize};

// Re-export all public types for convenient access
pub use traffic::{Disruption, OperationalStatus, Severity, StationStatus, TrafficSnapshot};
pub use weather::{RainForecast, WeatherSnapshot};
pub use zone::{Zone, ZoneCatalog};

/// Where a snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    /// Read from a live provider
    #[default]
    Live,
    /// Substituted because the provider could not answer
    Fallback,
}
