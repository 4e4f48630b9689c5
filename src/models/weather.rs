//! Weather snapshot model
//!
//! A snapshot is an immutable read of "now". Every field is defaulted on
//! deserialization, and readers go through the sanitising accessors so that
//! missing or out-of-range readings never reach the scoring math.

use serde::{Deserialize, Serialize};

use super::SnapshotSource;

/// Rain probability assumed when a forecast does not carry one
pub const DEFAULT_RAIN_PROBABILITY: f64 = 30.0;
/// Percentage points the +3h probability drops below +1h when only +1h is known
const THREE_HOUR_PROBABILITY_DROP: f64 = 15.0;

/// Near-term rain forecast attached to a weather snapshot
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RainForecast {
    /// Probability of rain in one hour (0-100)
    #[serde(default = "default_rain_probability")]
    pub rain_probability_1h: f64,
    /// Probability of rain in three hours (0-100)
    #[serde(default)]
    pub rain_probability_3h: Option<f64>,
    /// Expected conditions, e.g. "partly_cloudy"
    #[serde(default = "default_forecast_conditions")]
    pub conditions: String,
}

/// Current weather for the city
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// Temperature in Celsius
    #[serde(default = "default_temperature")]
    pub temperature_c: f64,
    /// Relative humidity in percent
    #[serde(default = "default_humidity")]
    pub humidity_pct: f64,
    /// Precipitation rate in mm/h
    #[serde(default)]
    pub precipitation_mm_h: f64,
    /// Wind speed in m/s
    #[serde(default = "default_wind_speed")]
    pub wind_speed_ms: f64,
    /// Visibility in kilometers
    #[serde(default = "default_visibility")]
    pub visibility_km: f64,
    /// Atmospheric pressure in hPa
    #[serde(default = "default_pressure")]
    pub pressure_hpa: f64,
    /// Human-readable description of weather conditions
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default)]
    pub forecast: RainForecast,
    /// Provider confidence in this reading (0.0-1.0)
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub source: SnapshotSource,
}

fn default_rain_probability() -> f64 {
    DEFAULT_RAIN_PROBABILITY
}

fn default_forecast_conditions() -> String {
    "partly_cloudy".to_string()
}

fn default_temperature() -> f64 {
    22.0
}

fn default_humidity() -> f64 {
    65.0
}

fn default_wind_speed() -> f64 {
    5.0
}

fn default_visibility() -> f64 {
    15.0
}

fn default_pressure() -> f64 {
    1013.0
}

fn default_description() -> String {
    "Partly Cloudy".to_string()
}

fn default_confidence() -> f64 {
    0.87
}

/// Confidence reported for the fallback snapshot
const FALLBACK_CONFIDENCE: f64 = 0.60;

fn clamp_probability(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        DEFAULT_RAIN_PROBABILITY
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

impl Default for RainForecast {
    fn default() -> Self {
        Self {
            rain_probability_1h: default_rain_probability(),
            rain_probability_3h: None,
            conditions: default_forecast_conditions(),
        }
    }
}

impl RainForecast {
    /// Rain probability in one hour, clamped to 0-100
    #[must_use]
    pub fn probability_1h(&self) -> f64 {
        clamp_probability(self.rain_probability_1h)
    }

    /// Rain probability in three hours; derived from the +1h value when absent
    #[must_use]
    pub fn probability_3h(&self) -> f64 {
        match self.rain_probability_3h {
            Some(p) => clamp_probability(p),
            None => (self.probability_1h() - THREE_HOUR_PROBABILITY_DROP).max(0.0),
        }
    }
}

impl Default for WeatherSnapshot {
    fn default() -> Self {
        Self {
            temperature_c: default_temperature(),
            humidity_pct: default_humidity(),
            precipitation_mm_h: 0.0,
            wind_speed_ms: default_wind_speed(),
            visibility_km: default_visibility(),
            pressure_hpa: default_pressure(),
            description: default_description(),
            forecast: RainForecast::default(),
            confidence: default_confidence(),
            source: SnapshotSource::Live,
        }
    }
}

impl WeatherSnapshot {
    /// Snapshot used when no provider could answer
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            description: "Partly Cloudy (Fallback)".to_string(),
            confidence: FALLBACK_CONFIDENCE,
            source: SnapshotSource::Fallback,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_precipitation(mut self, mm_per_hour: f64) -> Self {
        self.precipitation_mm_h = mm_per_hour;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature_c = celsius;
        self
    }

    #[must_use]
    pub fn with_rain_probability_1h(mut self, probability: f64) -> Self {
        self.forecast.rain_probability_1h = probability;
        self
    }

    #[must_use]
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    /// Precipitation in mm/h; missing or negative readings count as dry
    #[must_use]
    pub fn precipitation(&self) -> f64 {
        non_negative(self.precipitation_mm_h)
    }

    /// Temperature in Celsius; a non-finite reading falls back to 22 °C
    #[must_use]
    pub fn temperature(&self) -> f64 {
        if self.temperature_c.is_finite() {
            self.temperature_c
        } else {
            default_temperature()
        }
    }

    /// Rain is present whenever precipitation is above zero
    #[must_use]
    pub fn is_raining(&self) -> bool {
        self.precipitation() > 0.0
    }

    /// Provider confidence clamped to [0, 1]
    #[must_use]
    pub fn confidence(&self) -> f64 {
        if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 1.0)
        } else {
            FALLBACK_CONFIDENCE
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == SnapshotSource::Fallback
    }
}
