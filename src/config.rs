//! Configuration management for the taxi demand application
//!
//! Handles loading configuration from a JSON file and `TAXI_DEMAND_*`
//! environment overrides,
//! and carries the single canonical set of scoring tables shared by the
//! ranker, the driver recommendation generator and the passenger engine.

use crate::DemandError;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "TAXI_DEMAND_CONFIG";
/// Prefix of environment overrides; nested keys are joined with `__`,
/// e.g. `TAXI_DEMAND_PROVIDERS__TIMEOUT_SECONDS`
pub const ENV_PREFIX: &str = "TAXI_DEMAND";
/// Upper bound on driver recommendations returned per scoring cycle
pub const MAX_RECOMMENDATIONS: usize = 5;
/// Lowest confidence score a prediction may carry
pub const CONFIDENCE_FLOOR: f64 = 70.0;
/// Highest confidence score a prediction may carry
pub const CONFIDENCE_CEILING: f64 = 95.0;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub providers: ProviderConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Snapshot provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Upper bound on a single snapshot acquisition, in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_provider_timeout() -> u64 {
    10
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_provider_timeout(),
        }
    }
}

/// Canonical multiplier and threshold tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weather: WeatherTable,
    pub temporal: TemporalTable,
    pub disruption: DisruptionTable,
    pub performance: PerformanceModel,
    pub confidence: ConfidenceModel,
    pub recommendation: RecommendationPolicy,
    pub passenger: PassengerPolicy,
}

/// Rain tiers and temperature penalty.
///
/// Tiers are closed on their upper bound: precipitation `p` is light for
/// `0 < p <= light_rain_max_mm`, moderate for
/// `light_rain_max_mm < p <= heavy_rain_min_mm` and heavy above that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherTable {
    pub light_rain_max_mm: f64,
    pub heavy_rain_min_mm: f64,
    pub light_multiplier: f64,
    pub moderate_multiplier: f64,
    pub heavy_multiplier: f64,
    pub extreme_cold_below_c: f64,
    pub extreme_heat_above_c: f64,
    pub extreme_temperature_multiplier: f64,
}

/// Inclusive hour range, e.g. 7..=9
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RushWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl RushWindow {
    #[must_use]
    pub fn contains(&self, hour: u32) -> bool {
        (self.start_hour..=self.end_hour).contains(&hour)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalTable {
    /// Demand multiplier for every hour of the day, index = hour
    pub hourly: [f64; 24],
    /// Applied on top of the hourly value on Saturday and Sunday
    pub weekend_multiplier: f64,
    pub morning_rush: RushWindow,
    pub evening_rush: RushWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisruptionTable {
    /// Fractional demand boost per minute of estimated delay
    pub per_minute_boost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceModel {
    /// Revenue uplift of AI-guided positioning over baseline
    pub ai_uplift_factor: f64,
    pub baseline_wait_minutes: f64,
    pub baseline_utilization_pct: f64,
    /// Wait time of AI-guided drivers before the uplift is applied
    pub ai_reference_wait_minutes: f64,
    pub ai_reference_utilization_pct: f64,
    /// Utilization gain of AI-guided drivers, in percent of the reference rate
    pub ai_utilization_gain_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceModel {
    pub base: f64,
    pub rain_bonus: f64,
    pub disruption_bonus: f64,
    /// Subtracted when either snapshot is a fallback
    pub fallback_penalty: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationPolicy {
    /// Zones must exceed this expected demand increase (percent)
    pub min_increase_pct: f64,
    pub high_opportunity_pct: f64,
    pub max_recommendations: usize,
    pub base_travel_minutes: u32,
}

/// Cost and time model for one travel mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeTariff {
    pub flat_cost_yen: f64,
    pub cost_per_km_yen: f64,
    pub rain_surcharge_yen: f64,
    pub minutes_per_km: f64,
    pub rain_delay_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassengerPolicy {
    /// While raining, a +1h probability above this means rain continues
    pub continue_probability_pct: f64,
    /// While dry, a +1h probability below this means alternatives are fine
    pub clear_probability_pct: f64,
    /// While raining, a +1h probability below this means rain is clearing
    pub clearing_probability_pct: f64,
    pub wait_minutes: u32,
    pub default_distance_km: f64,
    pub taxi: ModeTariff,
    pub train: ModeTariff,
    pub walking: ModeTariff,
    pub confidence: f64,
    pub fallback_confidence: f64,
}

impl Default for WeatherTable {
    fn default() -> Self {
        Self {
            light_rain_max_mm: 1.0,
            heavy_rain_min_mm: 5.0,
            light_multiplier: 1.8,
            moderate_multiplier: 2.4,
            heavy_multiplier: 3.1,
            extreme_cold_below_c: 5.0,
            extreme_heat_above_c: 35.0,
            extreme_temperature_multiplier: 1.4,
        }
    }
}

impl Default for TemporalTable {
    fn default() -> Self {
        Self {
            hourly: [
                0.6, 0.4, 0.3, 0.2, 0.2, 0.3, // 00-05
                0.3, 0.8, 1.2, 0.9, 0.7, 0.8, // 06-11
                1.1, 0.9, 0.8, 0.9, 1.0, 1.3, // 12-17
                1.5, 1.4, 1.2, 1.1, 1.0, 0.8, // 18-23
            ],
            weekend_multiplier: 1.2,
            morning_rush: RushWindow {
                start_hour: 7,
                end_hour: 9,
            },
            evening_rush: RushWindow {
                start_hour: 17,
                end_hour: 19,
            },
        }
    }
}

impl Default for DisruptionTable {
    fn default() -> Self {
        Self {
            per_minute_boost: 0.01,
        }
    }
}

impl Default for PerformanceModel {
    fn default() -> Self {
        Self {
            ai_uplift_factor: 1.302,
            baseline_wait_minutes: 6.8,
            baseline_utilization_pct: 65.0,
            ai_reference_wait_minutes: 4.2,
            ai_reference_utilization_pct: 83.0,
            ai_utilization_gain_pct: 0.277,
        }
    }
}

impl Default for ConfidenceModel {
    fn default() -> Self {
        Self {
            base: 85.0,
            rain_bonus: 5.0,
            disruption_bonus: 3.0,
            fallback_penalty: 10.0,
            min: 70.0,
            max: 95.0,
        }
    }
}

impl Default for RecommendationPolicy {
    fn default() -> Self {
        Self {
            min_increase_pct: 25.0,
            high_opportunity_pct: 50.0,
            max_recommendations: MAX_RECOMMENDATIONS,
            base_travel_minutes: 15,
        }
    }
}

impl Default for PassengerPolicy {
    fn default() -> Self {
        Self {
            continue_probability_pct: 60.0,
            clear_probability_pct: 30.0,
            clearing_probability_pct: 40.0,
            wait_minutes: 45,
            default_distance_km: 5.0,
            taxi: ModeTariff {
                cost_per_km_yen: 400.0,
                rain_surcharge_yen: 200.0,
                minutes_per_km: 3.0,
                rain_delay_minutes: 5.0,
                ..ModeTariff::default()
            },
            train: ModeTariff {
                flat_cost_yen: 200.0,
                minutes_per_km: 2.0,
                rain_delay_minutes: 10.0,
                ..ModeTariff::default()
            },
            walking: ModeTariff {
                minutes_per_km: 12.0,
                rain_delay_minutes: 10.0,
                ..ModeTariff::default()
            },
            confidence: 0.85,
            fallback_confidence: 0.60,
        }
    }
}

impl AppConfig {
    /// Load configuration from `TAXI_DEMAND_CONFIG` or the working directory
    pub fn load() -> Result<Self> {
        Self::load_from_path(std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
    }

    /// Load configuration from specified path, then apply environment overrides
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        Self::load_with_environment(config_path, Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_with_environment(
        config_path: Option<PathBuf>,
        environment: Environment,
    ) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(|| PathBuf::from("taxi-demand.json"));

        let settings = Config::builder()
            .add_source(File::from(config_file).required(false).format(FileFormat::Json))
            .add_source(environment)
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from a JSON document; absent fields take defaults
    pub fn from_json(raw: &str) -> Result<Self> {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Json))
            .build()
            .with_context(|| "Failed to parse configuration")?
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.providers.timeout_seconds == 0 {
            self.providers.timeout_seconds = default_provider_timeout();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_logging()?;

        if self.providers.timeout_seconds > 120 {
            return Err(DemandError::config("Provider timeout cannot exceed 120 seconds").into());
        }

        self.scoring.validate()?;
        Ok(())
    }

    fn validate_logging(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(DemandError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "compact"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(DemandError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        Ok(())
    }
}

fn check_multiplier(name: &str, value: f64) -> std::result::Result<(), DemandError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(DemandError::config(format!(
            "{name} must be a finite, non-negative number (got {value})"
        )))
    }
}

fn check_probability(name: &str, value: f64) -> std::result::Result<(), DemandError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(DemandError::config(format!("{name} must be within 0-100 (got {value})")))
    }
}

impl ScoringConfig {
    /// Validate the scoring tables
    pub fn validate(&self) -> std::result::Result<(), DemandError> {
        let weather = &self.weather;
        check_multiplier("weather.light_multiplier", weather.light_multiplier)?;
        check_multiplier("weather.moderate_multiplier", weather.moderate_multiplier)?;
        check_multiplier("weather.heavy_multiplier", weather.heavy_multiplier)?;
        check_multiplier(
            "weather.extreme_temperature_multiplier",
            weather.extreme_temperature_multiplier,
        )?;
        if !(weather.light_rain_max_mm >= 0.0
            && weather.light_rain_max_mm < weather.heavy_rain_min_mm)
        {
            return Err(DemandError::config(
                "weather.light_rain_max_mm must be non-negative and below heavy_rain_min_mm",
            ));
        }
        if weather.extreme_cold_below_c >= weather.extreme_heat_above_c {
            return Err(DemandError::config(
                "weather.extreme_cold_below_c must be below weather.extreme_heat_above_c",
            ));
        }

        for (hour, value) in self.temporal.hourly.iter().enumerate() {
            check_multiplier(&format!("temporal.hourly[{hour}]"), *value)?;
        }
        check_multiplier("temporal.weekend_multiplier", self.temporal.weekend_multiplier)?;
        for window in [self.temporal.morning_rush, self.temporal.evening_rush] {
            if window.start_hour > window.end_hour || window.end_hour > 23 {
                return Err(DemandError::config(format!(
                    "Rush window {}-{} must be a non-empty range within 0-23",
                    window.start_hour, window.end_hour
                )));
            }
        }

        check_multiplier("disruption.per_minute_boost", self.disruption.per_minute_boost)?;

        let performance = &self.performance;
        if !(performance.ai_uplift_factor.is_finite() && performance.ai_uplift_factor > 0.0) {
            return Err(DemandError::config("performance.ai_uplift_factor must be positive"));
        }
        check_multiplier("performance.baseline_wait_minutes", performance.baseline_wait_minutes)?;
        check_multiplier(
            "performance.ai_reference_wait_minutes",
            performance.ai_reference_wait_minutes,
        )?;
        check_multiplier(
            "performance.ai_utilization_gain_pct",
            performance.ai_utilization_gain_pct,
        )?;
        check_probability(
            "performance.baseline_utilization_pct",
            performance.baseline_utilization_pct,
        )?;
        check_probability(
            "performance.ai_reference_utilization_pct",
            performance.ai_reference_utilization_pct,
        )?;

        let confidence = &self.confidence;
        for (name, value) in [
            ("confidence.base", confidence.base),
            ("confidence.rain_bonus", confidence.rain_bonus),
            ("confidence.disruption_bonus", confidence.disruption_bonus),
            ("confidence.fallback_penalty", confidence.fallback_penalty),
        ] {
            if !value.is_finite() {
                return Err(DemandError::config(format!("{name} must be finite (got {value})")));
            }
        }
        if !(confidence.min >= CONFIDENCE_FLOOR
            && confidence.max <= CONFIDENCE_CEILING
            && confidence.min <= confidence.max)
        {
            return Err(DemandError::config(format!(
                "confidence bounds {}-{} must lie within {CONFIDENCE_FLOOR}-{CONFIDENCE_CEILING}",
                confidence.min, confidence.max
            )));
        }

        let recommendation = &self.recommendation;
        if recommendation.max_recommendations == 0
            || recommendation.max_recommendations > MAX_RECOMMENDATIONS
        {
            return Err(DemandError::config(format!(
                "recommendation.max_recommendations must be within 1-{MAX_RECOMMENDATIONS}"
            )));
        }

        let passenger = &self.passenger;
        check_probability(
            "passenger.continue_probability_pct",
            passenger.continue_probability_pct,
        )?;
        check_probability("passenger.clear_probability_pct", passenger.clear_probability_pct)?;
        check_probability(
            "passenger.clearing_probability_pct",
            passenger.clearing_probability_pct,
        )?;
        check_multiplier("passenger.default_distance_km", passenger.default_distance_km)?;
        for confidence in [passenger.confidence, passenger.fallback_confidence] {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(DemandError::config("passenger confidences must be within 0.0-1.0"));
            }
        }

        Ok(())
    }
}
