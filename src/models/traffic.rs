//! Transit traffic snapshot model

use serde::{Deserialize, Serialize};

use super::SnapshotSource;

const BASE_PUNCTUALITY_RATE: f64 = 94.2;
const NO_STATION_PUNCTUALITY_RATE: f64 = 94.0;
const MIN_PUNCTUALITY_RATE: f64 = 70.0;
/// Punctuality points lost when every station reports a delay
const DELAYED_STATION_PENALTY: f64 = 10.0;
/// Punctuality points lost per active disruption
const DISRUPTION_PENALTY: f64 = 5.0;
/// Average delay reported when nothing is delayed
const BASELINE_DELAY_MINUTES: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OperationalStatus {
    #[default]
    Operational,
    Delayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
}

/// Status of a single station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationStatus {
    pub name: String,
    #[serde(default)]
    pub line: String,
    #[serde(default)]
    pub status: OperationalStatus,
    #[serde(default)]
    pub delay_minutes: u32,
    /// Congestion relative to a normal day (100 = normal)
    #[serde(default = "default_congestion_index")]
    pub congestion_index: f64,
}

/// An active service interruption on a transit line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disruption {
    pub line: String,
    #[serde(default)]
    pub station: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub estimated_delay_minutes: u32,
}

/// Transit system state at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSnapshot {
    #[serde(default)]
    pub stations: Vec<StationStatus>,
    #[serde(default)]
    pub disruptions: Vec<Disruption>,
    /// Share of services running on time, in percent
    #[serde(default = "default_punctuality_rate")]
    pub punctuality_rate: f64,
    #[serde(default = "default_average_delay")]
    pub average_delay_minutes: f64,
    #[serde(default)]
    pub source: SnapshotSource,
}

fn default_congestion_index() -> f64 {
    100.0
}

fn default_punctuality_rate() -> f64 {
    NO_STATION_PUNCTUALITY_RATE
}

fn default_average_delay() -> f64 {
    BASELINE_DELAY_MINUTES
}

impl StationStatus {
    #[must_use]
    pub fn operational<S: Into<String>, L: Into<String>>(name: S, line: L) -> Self {
        Self {
            name: name.into(),
            line: line.into(),
            status: OperationalStatus::Operational,
            delay_minutes: 0,
            congestion_index: default_congestion_index(),
        }
    }

    #[must_use]
    pub fn delayed<S: Into<String>, L: Into<String>>(name: S, line: L, delay_minutes: u32) -> Self {
        Self {
            status: OperationalStatus::Delayed,
            delay_minutes,
            ..Self::operational(name, line)
        }
    }
}

impl Disruption {
    #[must_use]
    pub fn new<S: Into<String>>(line: S, severity: Severity, estimated_delay_minutes: u32) -> Self {
        Self {
            line: line.into(),
            station: None,
            severity,
            estimated_delay_minutes,
        }
    }
}

impl Default for TrafficSnapshot {
    fn default() -> Self {
        Self::from_observations(Vec::new(), Vec::new())
    }
}

impl TrafficSnapshot {
    /// Build a snapshot and derive its aggregate punctuality and delay figures
    #[must_use]
    pub fn from_observations(stations: Vec<StationStatus>, disruptions: Vec<Disruption>) -> Self {
        let punctuality_rate = punctuality_rate(&stations, &disruptions);
        let average_delay_minutes = average_delay(&stations, &disruptions);

        Self {
            stations,
            disruptions,
            punctuality_rate,
            average_delay_minutes,
            source: SnapshotSource::Live,
        }
    }

    /// Snapshot used when no provider could answer
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            stations: vec![StationStatus::operational("Tokyo Station", "JR Yamanote")],
            disruptions: Vec::new(),
            punctuality_rate: 94.0,
            average_delay_minutes: 1.5,
            source: SnapshotSource::Fallback,
        }
    }

    #[must_use]
    pub fn has_disruptions(&self) -> bool {
        !self.disruptions.is_empty()
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == SnapshotSource::Fallback
    }
}

fn punctuality_rate(stations: &[StationStatus], disruptions: &[Disruption]) -> f64 {
    if stations.is_empty() {
        return NO_STATION_PUNCTUALITY_RATE;
    }

    let delayed = stations.iter().filter(|s| s.delay_minutes > 0).count();
    let delayed_share = delayed as f64 / stations.len() as f64;
    let penalty =
        delayed_share * DELAYED_STATION_PENALTY + disruptions.len() as f64 * DISRUPTION_PENALTY;

    (BASE_PUNCTUALITY_RATE - penalty).max(MIN_PUNCTUALITY_RATE)
}

fn average_delay(stations: &[StationStatus], disruptions: &[Disruption]) -> f64 {
    let delays: Vec<u32> = stations
        .iter()
        .map(|s| s.delay_minutes)
        .filter(|&d| d > 0)
        .chain(disruptions.iter().map(|d| d.estimated_delay_minutes))
        .collect();

    if delays.is_empty() {
        return BASELINE_DELAY_MINUTES;
    }

    delays.iter().map(|&d| f64::from(d)).sum::<f64>() / delays.len() as f64
}
