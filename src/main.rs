use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use taxi_demand::{
    AppConfig, DemandEngine, DemandError, DemandPrediction, DriverRecommendation,
    JsonFileProvider, PassengerAdvice, ZoneCatalog, acquire_snapshots, logging,
};
use tracing::{error, info};

/// Score taxi demand across Tokyo zones and print a JSON report
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Weather snapshot JSON file; fallback weather is used when absent
    #[arg(long)]
    weather: Option<PathBuf>,
    /// Traffic snapshot JSON file; fallback traffic is used when absent
    #[arg(long)]
    traffic: Option<PathBuf>,
    /// Passenger trip origin
    #[arg(long = "from", default_value = "Shibuya")]
    origin: String,
    /// Passenger trip destination
    #[arg(long = "to", default_value = "Tokyo Station")]
    destination: String,
}

#[derive(Serialize)]
struct Report<'a> {
    predictions: &'a [DemandPrediction],
    recommendations: &'a [DriverRecommendation],
    passenger: &'a PassengerAdvice,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = ?err, "Scoring cycle failed");
            match err.downcast_ref::<DemandError>() {
                Some(demand_err) => eprintln!("{}\n{err:#}", demand_err.user_message()),
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.logging);

    let engine = DemandEngine::try_new(ZoneCatalog::tokyo(), config.scoring)?;
    let provider = JsonFileProvider::new(cli.weather, cli.traffic);
    let snapshots = acquire_snapshots(
        &provider,
        &provider,
        Duration::from_secs(config.providers.timeout_seconds),
    )
    .await;

    let clock = chrono::Local::now().naive_local();
    let predictions = engine.rank_zones(&snapshots.weather, &snapshots.traffic, clock);
    let recommendations = engine.driver_recommendations(&predictions);
    let passenger =
        engine.passenger_advice(Some(&snapshots.weather), &cli.origin, &cli.destination);

    info!(
        zones = predictions.len(),
        recommendations = recommendations.len(),
        decision = ?passenger.decision,
        "Scoring cycle complete"
    );

    let report = Report {
        predictions: &predictions,
        recommendations: &recommendations,
        passenger: &passenger,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
