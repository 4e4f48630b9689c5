//! Zone catalog: the fixed set of city areas tracked for demand scoring

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

/// A fixed named area of the city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Baseline taxi revenue per minute (yen)
    pub base_revenue_per_min: f64,
    /// Location-specific demand factor relative to an average zone
    pub location_factor: f64,
    /// Major rail interchange
    #[serde(default)]
    pub is_transit_hub: bool,
    /// Minutes added to the base repositioning time for this zone
    #[serde(default)]
    pub travel_offset_minutes: u32,
}

impl Zone {
    #[must_use]
    pub fn new<S: Into<String>>(
        name: S,
        latitude: f64,
        longitude: f64,
        base_revenue_per_min: f64,
        location_factor: f64,
    ) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            base_revenue_per_min,
            location_factor,
            is_transit_hub: false,
            travel_offset_minutes: 0,
        }
    }

    #[must_use]
    pub fn transit_hub(mut self) -> Self {
        self.is_transit_hub = true;
        self
    }

    #[must_use]
    pub fn with_travel_offset(mut self, minutes: u32) -> Self {
        self.travel_offset_minutes = minutes;
        self
    }

    /// Great-circle distance to another zone in kilometers
    #[must_use]
    pub fn distance_km(&self, other: &Zone) -> f64 {
        let from = HaversineLocation {
            latitude: self.latitude,
            longitude: self.longitude,
        };
        let to = HaversineLocation {
            latitude: other.latitude,
            longitude: other.longitude,
        };
        distance(from, to, Units::Kilometers)
    }
}

/// Ordered, read-only set of zones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneCatalog {
    zones: Vec<Zone>,
}

impl ZoneCatalog {
    #[must_use]
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self { zones: Vec::new() }
    }

    /// Central Tokyo districts
    #[must_use]
    pub fn tokyo() -> Self {
        Self::new(vec![
            Zone::new("Ginza", 35.6762, 139.7653, 62.5, 1.3).with_travel_offset(3),
            Zone::new("Tokyo Station", 35.6812, 139.7671, 59.8, 1.6)
                .transit_hub()
                .with_travel_offset(6),
            Zone::new("Shibuya", 35.6598, 139.7006, 58.2, 1.4)
                .transit_hub()
                .with_travel_offset(8),
            Zone::new("Shinjuku", 35.6896, 139.6917, 55.8, 1.5)
                .transit_hub()
                .with_travel_offset(4),
            Zone::new("Roppongi", 35.6627, 139.7314, 54.2, 1.2).with_travel_offset(7),
            Zone::new("Harajuku", 35.6702, 139.7027, 51.4, 1.1).with_travel_offset(2),
            Zone::new("Akihabara", 35.7022, 139.7745, 49.7, 1.0).with_travel_offset(5),
            Zone::new("Ikebukuro", 35.7295, 139.7109, 52.6, 1.2).with_travel_offset(9),
            Zone::new("Ueno", 35.7141, 139.7773, 48.3, 1.0).with_travel_offset(1),
            Zone::new("Asakusa", 35.7148, 139.7967, 47.5, 0.9),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Look a zone up by name, ignoring case and surrounding whitespace
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Zone> {
        let name = name.trim();
        self.zones.iter().find(|z| z.name.eq_ignore_ascii_case(name))
    }
}

impl Default for ZoneCatalog {
    fn default() -> Self {
        Self::tokyo()
    }
}
