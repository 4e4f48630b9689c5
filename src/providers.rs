//! Snapshot providers
//!
//! Weather and traffic acquisition happens outside the engine. Providers are
//! queried concurrently, each bounded by a timeout, and any failure is
//! replaced by the documented fallback snapshot so the engine always gets
//! something to score.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task;
use tracing::{debug, warn};

use crate::error::DemandError;
use crate::models::{TrafficSnapshot, WeatherSnapshot};

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn weather_snapshot(&self) -> Result<WeatherSnapshot>;
}

#[async_trait]
pub trait TrafficProvider: Send + Sync {
    async fn traffic_snapshot(&self) -> Result<TrafficSnapshot>;
}

/// Both snapshots for one scoring cycle
#[derive(Debug, Clone)]
pub struct Snapshots {
    pub weather: WeatherSnapshot,
    pub traffic: TrafficSnapshot,
}

/// Serves fixed snapshots; a missing snapshot is reported as a provider error
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    weather: Option<WeatherSnapshot>,
    traffic: Option<TrafficSnapshot>,
}

impl StaticProvider {
    #[must_use]
    pub fn new(weather: Option<WeatherSnapshot>, traffic: Option<TrafficSnapshot>) -> Self {
        Self { weather, traffic }
    }
}

#[async_trait]
impl WeatherProvider for StaticProvider {
    async fn weather_snapshot(&self) -> Result<WeatherSnapshot> {
        self.weather
            .clone()
            .ok_or_else(|| DemandError::provider("weather", "no snapshot configured").into())
    }
}

#[async_trait]
impl TrafficProvider for StaticProvider {
    async fn traffic_snapshot(&self) -> Result<TrafficSnapshot> {
        self.traffic
            .clone()
            .ok_or_else(|| DemandError::provider("traffic", "no snapshot configured").into())
    }
}

/// Reads snapshots from JSON files on every request
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    weather_path: Option<PathBuf>,
    traffic_path: Option<PathBuf>,
}

impl JsonFileProvider {
    #[must_use]
    pub fn new(weather_path: Option<PathBuf>, traffic_path: Option<PathBuf>) -> Self {
        Self {
            weather_path,
            traffic_path,
        }
    }
}

async fn read_json<T: DeserializeOwned + Send + 'static>(
    provider: &str,
    path: Option<&Path>,
) -> Result<T> {
    let path = path
        .map(Path::to_path_buf)
        .ok_or_else(|| DemandError::provider(provider, "no snapshot file configured"))?;

    let display = path.display().to_string();
    let raw = task::spawn_blocking(move || std::fs::read_to_string(path))
        .await?
        .map_err(DemandError::from)
        .with_context(|| format!("Failed to read {provider} snapshot: {display}"))?;

    serde_json::from_str(&raw)
        .map_err(DemandError::from)
        .with_context(|| format!("Failed to parse {provider} snapshot: {display}"))
}

#[async_trait]
impl WeatherProvider for JsonFileProvider {
    async fn weather_snapshot(&self) -> Result<WeatherSnapshot> {
        read_json("weather", self.weather_path.as_deref()).await
    }
}

#[async_trait]
impl TrafficProvider for JsonFileProvider {
    async fn traffic_snapshot(&self) -> Result<TrafficSnapshot> {
        read_json("traffic", self.traffic_path.as_deref()).await
    }
}

async fn bounded<T>(
    provider: &str,
    limit: Duration,
    request: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, request).await {
        Ok(result) => result,
        Err(_) => Err(DemandError::timeout(provider, limit).into()),
    }
}

/// Fetch both snapshots concurrently, substituting fallbacks on error or timeout
pub async fn acquire_snapshots(
    weather: &dyn WeatherProvider,
    traffic: &dyn TrafficProvider,
    timeout: Duration,
) -> Snapshots {
    let (weather, traffic) = futures::future::join(
        bounded("weather", timeout, weather.weather_snapshot()),
        bounded("traffic", timeout, traffic.traffic_snapshot()),
    )
    .await;

    let weather = weather.unwrap_or_else(|err| {
        warn!(error = %err, "Weather acquisition failed, using fallback snapshot");
        WeatherSnapshot::fallback()
    });
    let traffic = traffic.unwrap_or_else(|err| {
        warn!(error = %err, "Traffic acquisition failed, using fallback snapshot");
        TrafficSnapshot::fallback()
    });

    debug!(
        raining = weather.is_raining(),
        disruptions = traffic.disruptions.len(),
        "Snapshots acquired"
    );

    Snapshots { weather, traffic }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Disruption, Severity, SnapshotSource};

    struct SlowWeather;

    #[async_trait]
    impl WeatherProvider for SlowWeather {
        async fn weather_snapshot(&self) -> Result<WeatherSnapshot> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(WeatherSnapshot::default())
        }
    }

    #[tokio::test]
    async fn test_live_snapshots_pass_through() {
        let traffic = TrafficSnapshot::from_observations(
            Vec::new(),
            vec![Disruption::new("JR Yamanote", Severity::High, 12)],
        );
        let provider = StaticProvider::new(
            Some(WeatherSnapshot::default().with_precipitation(4.0)),
            Some(traffic),
        );

        let snapshots = acquire_snapshots(&provider, &provider, Duration::from_secs(1)).await;

        assert_eq!(snapshots.weather.source, SnapshotSource::Live);
        assert!(snapshots.weather.is_raining());
        assert!(snapshots.traffic.has_disruptions());
    }

    #[tokio::test]
    async fn test_missing_snapshots_fall_back() {
        let provider = StaticProvider::default();

        let snapshots = acquire_snapshots(&provider, &provider, Duration::from_secs(1)).await;

        assert!(snapshots.weather.is_fallback());
        assert!(snapshots.traffic.is_fallback());
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let traffic = StaticProvider::new(None, Some(TrafficSnapshot::default()));

        let snapshots = acquire_snapshots(&SlowWeather, &traffic, Duration::from_millis(50)).await;

        assert!(snapshots.weather.is_fallback());
        assert!(!snapshots.traffic.is_fallback());
    }

    #[tokio::test]
    async fn test_unreadable_file_falls_back() {
        let provider =
            JsonFileProvider::new(Some(PathBuf::from("/nonexistent/weather.json")), None);

        let err = provider.weather_snapshot().await.unwrap_err();
        assert!(err.to_string().contains("Failed to read weather snapshot"));
        assert!(matches!(err.downcast_ref::<DemandError>(), Some(DemandError::Io { .. })));

        let snapshots = acquire_snapshots(&provider, &provider, Duration::from_secs(1)).await;
        assert!(snapshots.weather.is_fallback());
        assert!(snapshots.traffic.is_fallback());
    }

    #[tokio::test]
    async fn test_json_file_snapshot() {
        let path = std::env::temp_dir()
            .join(format!("taxi-demand-weather-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"precipitation_mm_h": 6.5, "description": "Heavy Rain"}"#,
        )
        .unwrap();
        let provider = JsonFileProvider::new(Some(path.clone()), None);

        let weather = provider.weather_snapshot().await.unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(weather.description, "Heavy Rain");
        assert_eq!(weather.precipitation(), 6.5);
        assert_eq!(weather.temperature(), 22.0);
    }
}
